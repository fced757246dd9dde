//! Antenna gain at the ray's takeoff angles.
//!
//! The engine asks each end for its gain toward the other end at the
//! mode's elevation; anything answering [`AntennaGain`] plugs in. The
//! built-in implementations cover the unity-gain reference and a
//! tabulated pattern on a regular angle grid.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ConfigError;

/// Directional gain seen from one end of the circuit.
pub trait AntennaGain: Sync {
    /// Gain in dBi toward `azimuth` at `elevation` (radians) for
    /// `frequency_mhz`.
    fn gain_db(&self, elevation: f64, azimuth: f64, frequency_mhz: f64) -> f64;
}

/// Unity-gain reference antenna.
#[derive(Debug, Clone, Copy, Default)]
pub struct Isotropic;

impl AntennaGain for Isotropic {
    fn gain_db(&self, _elevation: f64, _azimuth: f64, _frequency_mhz: f64) -> f64 {
        0.0
    }
}

/// One frequency plane of a tabulated pattern: gain on a regular grid,
/// outer index azimuth (wrapping at 360 degrees), inner index elevation
/// from the horizon to the zenith.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternPlane {
    pub frequency_mhz: f64,
    pub azimuth_step_deg: f64,
    pub elevation_step_deg: f64,
    pub gain_dbi: Vec<Vec<f64>>,
}

impl PatternPlane {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.frequency_mhz.is_finite() || self.frequency_mhz <= 0.0 {
            return Err(ConfigError::MalformedPattern("non-positive frequency plane"));
        }
        let az_rows = grid_count(360.0, self.azimuth_step_deg)
            .ok_or(ConfigError::MalformedPattern("azimuth step must divide 360"))?;
        let el_cols = grid_count(90.0, self.elevation_step_deg)
            .ok_or(ConfigError::MalformedPattern("elevation step must divide 90"))?
            + 1;
        if self.gain_dbi.len() != az_rows {
            return Err(ConfigError::MalformedPattern("azimuth row count mismatch"));
        }
        for row in &self.gain_dbi {
            if row.len() != el_cols {
                return Err(ConfigError::MalformedPattern("elevation column count mismatch"));
            }
            if row.iter().any(|g| !g.is_finite()) {
                return Err(ConfigError::MalformedPattern("non-finite gain entry"));
            }
        }
        Ok(())
    }

    fn lookup(&self, elevation_deg: f64, azimuth_deg: f64) -> f64 {
        let az_rows = self.gain_dbi.len();
        let az = azimuth_deg.rem_euclid(360.0) / self.azimuth_step_deg;
        let a0 = (az as usize) % az_rows;
        let a1 = (a0 + 1) % az_rows;
        let fa = az - az.floor();

        let el_cols = self.gain_dbi[0].len();
        let el = (elevation_deg.clamp(0.0, 90.0)) / self.elevation_step_deg;
        let e0 = (el as usize).min(el_cols - 1);
        let e1 = (e0 + 1).min(el_cols - 1);
        let fe = el - el.floor();

        let ll = self.gain_dbi[a0][e0];
        let lr = self.gain_dbi[a0][e1];
        let ul = self.gain_dbi[a1][e0];
        let ur = self.gain_dbi[a1][e1];
        ll * (1.0 - fa) * (1.0 - fe) + lr * (1.0 - fa) * fe + ul * fa * (1.0 - fe) + ur * fa * fe
    }
}

fn grid_count(span_deg: f64, step_deg: f64) -> Option<usize> {
    if !step_deg.is_finite() || step_deg <= 0.0 || step_deg > span_deg {
        return None;
    }
    let count = span_deg / step_deg;
    if (count - count.round()).abs() > 1e-9 {
        return None;
    }
    Some(count.round() as usize)
}

/// A measured or modeled pattern, bilinearly interpolated within the
/// nearest frequency plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternTable {
    planes: Vec<PatternPlane>,
}

impl PatternTable {
    pub fn new(planes: Vec<PatternPlane>) -> Result<Self, ConfigError> {
        if planes.is_empty() {
            return Err(ConfigError::MalformedPattern("no frequency planes"));
        }
        for plane in &planes {
            plane.validate()?;
        }
        Ok(Self { planes })
    }

    fn nearest_plane(&self, frequency_mhz: f64) -> &PatternPlane {
        let mut best = &self.planes[0];
        for plane in &self.planes[1..] {
            if (plane.frequency_mhz - frequency_mhz).abs() < (best.frequency_mhz - frequency_mhz).abs() {
                best = plane;
            }
        }
        best
    }
}

impl AntennaGain for PatternTable {
    fn gain_db(&self, elevation: f64, azimuth: f64, frequency_mhz: f64) -> f64 {
        self.nearest_plane(frequency_mhz)
            .lookup(elevation * R2D, azimuth.rem_euclid(2.0 * std::f64::consts::PI) * R2D)
    }
}
