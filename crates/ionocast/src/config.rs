//! Typed circuit configuration.
//!
//! Everything the engine needs to know about a circuit that is not hourly
//! state: terminals, month, solar activity, the link budget and the receiver
//! siting. Validation happens once at construction; the evaluator never
//! substitutes defaults for bad input.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ConfigError;
use crate::ionosphere::SolarIndices;
use crate::path::{GeographicPoint, PathGeometry};

pub use noisefloor::EnvironmentCategory;

/// Planning presets bundling bandwidth and the SNR a service needs to be
/// usable in that bandwidth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceKind {
    /// Single-sideband voice in a 2.7 kHz channel.
    VoiceSsb,
    /// Narrowband digital traffic, 300 Hz.
    NarrowbandData,
    /// Aural CW, 100 Hz.
    Cw,
}

impl ServiceKind {
    pub fn bandwidth_hz(self) -> f64 {
        match self {
            ServiceKind::VoiceSsb => 2700.0,
            ServiceKind::NarrowbandData => 300.0,
            ServiceKind::Cw => 100.0,
        }
    }

    pub fn required_snr_db(self) -> f64 {
        match self {
            ServiceKind::VoiceSsb => 15.0,
            ServiceKind::NarrowbandData => 22.0,
            ServiceKind::Cw => 8.0,
        }
    }
}

/// Link budget terms supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkParameters {
    pub transmit_power_w: f64,
    pub required_snr_db: f64,
    pub bandwidth_hz: f64,
}

impl LinkParameters {
    pub fn new(
        transmit_power_w: f64,
        required_snr_db: f64,
        bandwidth_hz: f64,
    ) -> Result<Self, ConfigError> {
        let link = Self {
            transmit_power_w,
            required_snr_db,
            bandwidth_hz,
        };
        link.validate()?;
        Ok(link)
    }

    /// Preset bandwidth and threshold for a service at a given power.
    pub fn for_service(kind: ServiceKind, transmit_power_w: f64) -> Result<Self, ConfigError> {
        Self::new(transmit_power_w, kind.required_snr_db(), kind.bandwidth_hz())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.transmit_power_w.is_finite() || self.transmit_power_w <= 0.0 {
            return Err(ConfigError::InvalidPower(self.transmit_power_w));
        }
        if !self.bandwidth_hz.is_finite() || self.bandwidth_hz <= 0.0 {
            return Err(ConfigError::InvalidBandwidth(self.bandwidth_hz));
        }
        Ok(())
    }

    /// Transmit power in dBW.
    pub fn power_dbw(&self) -> f64 {
        10.0 * self.transmit_power_w.log10()
    }
}

/// A complete circuit description for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitConfig {
    pub transmitter: GeographicPoint,
    pub receiver: GeographicPoint,
    /// Month of the year, 1..=12.
    pub month: u32,
    pub indices: SolarIndices,
    pub link: LinkParameters,
    /// Receiver siting for the man-made noise floor.
    pub rx_environment: EnvironmentCategory,
}

impl CircuitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=12).contains(&self.month) {
            return Err(ConfigError::InvalidMonth(self.month));
        }
        self.link.validate()
    }

    /// Build the immutable ground-track geometry for this circuit.
    pub fn path(&self) -> Result<PathGeometry, ConfigError> {
        PathGeometry::new(self.transmitter, self.receiver)
    }
}

/// Check an operating frequency against the HF band the model covers.
pub fn validate_frequency(frequency_mhz: f64) -> Result<(), ConfigError> {
    if !frequency_mhz.is_finite() || frequency_mhz <= 0.0 {
        return Err(ConfigError::InvalidFrequency(frequency_mhz));
    }
    if !(BAND_MIN_MHZ..=BAND_MAX_MHZ).contains(&frequency_mhz) {
        return Err(ConfigError::FrequencyOutOfBand(
            frequency_mhz,
            BAND_MIN_MHZ,
            BAND_MAX_MHZ,
        ));
    }
    Ok(())
}
