//! Configuration-contract errors.
//!
//! Only boundary violations surface as errors. Geometric no-solution and
//! solver non-convergence are ordinary outcomes expressed as absent modes.

use crate::ionosphere::Layer;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("terminals coincide; a circuit needs a non-zero great-circle distance")]
    DegeneratePath,

    #[error("latitude {0} degrees is outside +/-90")]
    InvalidLatitude(f64),

    #[error("hop count must be at least 1, got {0}")]
    InvalidHopCount(usize),

    #[error("frequency must be positive and finite, got {0} MHz")]
    InvalidFrequency(f64),

    #[error("frequency {0} MHz is outside the {1}..{2} MHz band")]
    FrequencyOutOfBand(f64, f64, f64),

    #[error("{layer:?} layer state malformed: {reason}")]
    MalformedLayer { layer: Layer, reason: &'static str },

    #[error("transmit power must be positive and finite, got {0} W")]
    InvalidPower(f64),

    #[error("bandwidth must be positive and finite, got {0} Hz")]
    InvalidBandwidth(f64),

    #[error("sunspot number must be finite and non-negative, got {0}")]
    InvalidSunspotNumber(f64),

    #[error("hour must be in 0..24, got {0}")]
    InvalidHour(u32),

    #[error("month must be in 1..=12, got {0}")]
    InvalidMonth(u32),

    #[error("sweep plan contains no hours or no frequencies")]
    EmptySweep,

    #[error("antenna pattern malformed: {0}")]
    MalformedPattern(&'static str),

    #[error(transparent)]
    Noise(#[from] noisefloor::NoiseError),
}
