//! HF skywave propagation prediction for point-to-point circuit planning.
//!
//! Given a transmitter/receiver pair, a month, a solar-activity level and a
//! link budget, the crate forecasts for each hour and frequency whether the
//! circuit will carry: which ionospheric modes connect the terminals, the
//! circuit MUF and its day-to-day statistics, the expected SNR distribution
//! against the ambient noise at the receiver, and the reliability — the
//! probability of clearing the required SNR on a given day.
//!
//! The pieces compose bottom-up: [`reflectrix`] searches (layer, hop-count)
//! geometries and prices each valid mode through [`loss`]; [`muf`] selects
//! the dominant mode and its exceedance statistics; the ambient noise comes
//! from the companion `noisefloor` crate; [`engine`] ties them together per
//! (hour, frequency) and [`sweep`] fans a whole planning grid across a rayon
//! pool. Layer state and antenna gain stay behind the [`IonosphereModel`] and
//! [`AntennaGain`] traits so map-driven providers can replace the built-in
//! parametric defaults.
//!
//! ```no_run
//! use ionocast::*;
//!
//! # fn main() -> Result<(), ConfigError> {
//! let config = CircuitConfig {
//!     transmitter: GeographicPoint::from_degrees(53.3, -6.2)?,
//!     receiver: GeographicPoint::from_degrees(40.7, -74.0)?,
//!     month: 5,
//!     indices: SolarIndices::from_ssn(100.0)?,
//!     link: LinkParameters::for_service(ServiceKind::VoiceSsb, 100.0)?,
//!     rx_environment: EnvironmentCategory::Residential,
//! };
//! let result = predict_circuit(&config, 12, 14.0)?;
//! println!("reliability {:.1}%", 100.0 * result.reliability);
//! # Ok(())
//! # }
//! ```

pub mod antenna;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod ionosphere;
pub mod loss;
pub mod muf;
pub mod path;
pub mod reflectrix;
pub mod solar;
pub mod stats;
pub mod sweep;

pub use antenna::{AntennaGain, Isotropic, PatternPlane, PatternTable};
pub use config::{
    validate_frequency, CircuitConfig, EnvironmentCategory, LinkParameters, ServiceKind,
};
pub use engine::{snr_reliability, HourContext, PredictionEngine, PredictionResult};
pub use error::ConfigError;
pub use ionosphere::{
    FixedIonosphere, IonosphereModel, Layer, LayerProfile, LayerState, ParametricIonosphere,
    SolarIndices,
};
pub use loss::LossBreakdown;
pub use muf::{MufDeciles, MufResult};
pub use path::{GeographicPoint, PathGeometry, Season};
pub use reflectrix::{Mode, ModeId};
pub use sweep::{run_sweep, CancellationToken, SweepPlan, SweepResult};

pub use noisefloor::{ambient_noise, AmbientNoise, Distribution, NoiseSource};

/// One-shot prediction with the built-in parametric ionosphere and isotropic
/// antennas at both ends.
pub fn predict_circuit(
    config: &CircuitConfig,
    hour_utc: u32,
    frequency_mhz: f64,
) -> Result<PredictionResult, ConfigError> {
    let ionosphere = ParametricIonosphere;
    let engine = PredictionEngine::new(config, &ionosphere, &Isotropic, &Isotropic)?;
    engine.evaluate_at(hour_utc, frequency_mhz)
}
