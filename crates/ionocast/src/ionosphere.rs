//! Ionospheric layer state and the models that provide it.
//!
//! The prediction core only consumes `{critical frequency, reflection
//! height}` per layer and hour. Where those come from is behind
//! [`IonosphereModel`]: map-driven providers live with the caller, while this
//! module ships two self-contained implementations — [`ParametricIonosphere`],
//! a solar-zenith-driven monthly-median model, and [`FixedIonosphere`] for
//! externally supplied or test profiles.

use crate::constants::*;
use crate::error::ConfigError;
use crate::path::GeographicPoint;
use crate::solar::{solar_position, SolarPosition};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Ionospheric layers the ray search considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    E,
    F1,
    F2,
}

impl Layer {
    /// Most hops a mode of this layer may take.
    pub fn max_hops(self) -> usize {
        match self {
            Layer::E => MAX_E_HOPS,
            Layer::F1 => MAX_F1_HOPS,
            Layer::F2 => MAX_F2_HOPS,
        }
    }

    /// Semi-thickness of the quasi-parabolic electron-density profile (km).
    pub fn semi_thickness_km(self) -> f64 {
        match self {
            Layer::E => 20.0,
            Layer::F1 => 40.0,
            Layer::F2 => 100.0,
        }
    }
}

/// One layer for one hour: vertical-incidence critical frequency and the
/// height a mirror reflection is taken to occur at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerState {
    pub critical_frequency_mhz: f64,
    pub reflection_height_km: f64,
}

impl LayerState {
    pub fn validate(&self, layer: Layer) -> Result<(), ConfigError> {
        if !self.critical_frequency_mhz.is_finite() || self.critical_frequency_mhz <= 0.0 {
            return Err(ConfigError::MalformedLayer {
                layer,
                reason: "critical frequency must be positive and finite",
            });
        }
        if !self.reflection_height_km.is_finite()
            || self.reflection_height_km < 70.0
            || self.reflection_height_km > 1000.0
        {
            return Err(ConfigError::MalformedLayer {
                layer,
                reason: "reflection height must lie between 70 and 1000 km",
            });
        }
        Ok(())
    }
}

/// Per-hour snapshot of the reflecting layers at the path midpoint.
/// F1 is present only while the layer exists (daylight).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerProfile {
    pub e: LayerState,
    pub f1: Option<LayerState>,
    pub f2: LayerState,
}

impl LayerProfile {
    pub fn get(&self, layer: Layer) -> Option<LayerState> {
        match layer {
            Layer::E => Some(self.e),
            Layer::F1 => self.f1,
            Layer::F2 => Some(self.f2),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.e.validate(Layer::E)?;
        if let Some(f1) = self.f1 {
            f1.validate(Layer::F1)?;
        }
        self.f2.validate(Layer::F2)
    }
}

/// Solar-activity indices for the evaluated date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarIndices {
    pub sunspot_number: f64,
    pub solar_flux: f64,
}

impl SolarIndices {
    /// Construct from a smoothed sunspot number; the 10.7 cm flux follows
    /// from the standard monthly-mean relation.
    pub fn from_ssn(ssn: f64) -> Result<Self, ConfigError> {
        if !ssn.is_finite() || ssn < 0.0 {
            return Err(ConfigError::InvalidSunspotNumber(ssn));
        }
        Ok(Self {
            sunspot_number: ssn,
            solar_flux: 63.7 + 0.728 * ssn + 0.00089 * ssn * ssn,
        })
    }
}

/// Source of per-hour layer state. `Sync` so one model can serve a parallel
/// sweep over hours and frequencies.
pub trait IonosphereModel: Sync {
    fn layers(
        &self,
        at: GeographicPoint,
        month: u32,
        hour_utc: u32,
        indices: SolarIndices,
    ) -> LayerProfile;
}

/// A monthly-median parametric ionosphere.
///
/// E-layer critical frequency follows the four-factor solar-activity,
/// seasonal, latitude and time-of-day method; F2 and F1 use condensed
/// sunspot-scaled diurnal shapes. Suitable for planning when no coefficient
/// maps are wired in; exact map-driven state can replace it behind the same
/// trait.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParametricIonosphere;

// SSN above this value no longer raises the E-layer ionization.
const FOE_MAX_SSN: f64 = 160.0;

// F2 relaxation time constant after sunset, hours.
const F2_DECAY_HOURS: f64 = 2.5;

impl IonosphereModel for ParametricIonosphere {
    fn layers(
        &self,
        at: GeographicPoint,
        month: u32,
        hour_utc: u32,
        indices: SolarIndices,
    ) -> LayerProfile {
        let sun = solar_position(at, month, hour_utc as f64);
        let foe = find_foe(at, &sun, month, hour_utc as f64, indices.sunspot_number);
        let (fof2, m3000) = find_fof2(at, &sun, hour_utc as f64, indices.sunspot_number);
        let fof1 = find_fof1(&sun, indices.sunspot_number);

        // Mirror height of the F2 layer from the transmission factor.
        let hr_f2 = f64::min(1490.0 / m3000 - 176.0, 500.0);

        LayerProfile {
            e: LayerState {
                critical_frequency_mhz: foe,
                reflection_height_km: E_HEIGHT_KM,
            },
            f1: fof1.map(|f| LayerState {
                critical_frequency_mhz: f,
                reflection_height_km: 200.0,
            }),
            f2: LayerState {
                critical_frequency_mhz: fof2,
                reflection_height_km: hr_f2,
            },
        }
    }
}

/// E-layer critical frequency, MHz.
///
/// Four multiplicative parts: solar activity (A), season (B), latitude (C)
/// and time of day (D), combined as the fourth root, with a solar-flux floor
/// for the deep night.
fn find_foe(
    at: GeographicPoint,
    sun: &SolarPosition,
    month: u32,
    hour_utc: f64,
    ssn: f64,
) -> f64 {
    let ssn = ssn.min(FOE_MAX_SSN);
    let phi = 63.7 + 0.728 * ssn + 0.00089 * ssn * ssn;
    let a = 1.0 + 0.0094 * (phi - 66.0);

    let m = if at.lat.abs() < 32.0 * D2R {
        -1.93 + 1.92 * f64::cos(at.lat)
    } else {
        0.11 - 0.49 * f64::cos(at.lat)
    };
    let n = if (at.lat - sun.declination).abs() < 80.0 * D2R {
        at.lat - sun.declination
    } else {
        80.0 * D2R
    };
    let b = f64::powf(f64::cos(n), m);

    let (x, y) = if at.lat.abs() < 32.0 * D2R {
        (23.0, 116.0)
    } else {
        (92.0, 35.0)
    };
    let c = x + y * f64::cos(at.lat);

    let p = if at.lat.abs() <= 12.0 * D2R { 1.31 } else { 1.2 };
    let sza = sun.zenith_angle;

    let d = if sza <= 73.0 * D2R {
        f64::powf(f64::cos(sza), p)
    } else if sza < PI / 2.0 {
        // Twilight correction to the zenith angle.
        let dsza = 6.27e-13 * f64::powf(sza * R2D - 50.0, 8.0) * D2R;
        f64::powf(f64::cos(sza - dsza), p)
    } else {
        let h = sun.hours_after_sunset((hour_utc + 1.0) % 24.0);
        let residual = f64::powf(0.072, p) * f64::exp(25.2 - 0.28 * sza * R2D);
        if polar_winter(at.lat, month) {
            residual
        } else {
            f64::max(f64::powf(0.072, p) * f64::exp(-1.4 * h), residual)
        }
    };

    f64::max(
        f64::powf(a * b * c * d, 0.25),
        f64::powf(0.004 * f64::powf(1.0 + 0.021 * phi, 2.0), 0.25),
    )
}

// Civil polar night: the sun stays more than 6 degrees below the horizon
// all day. Approximated by the months around the local winter solstice.
fn polar_winter(lat: f64, month: u32) -> bool {
    (lat > 72.5622 * D2R && matches!(month, 11 | 12 | 1))
        || (lat < -72.5622 * D2R && matches!(month, 5 | 6 | 7))
}

/// F2 critical frequency and M(3000) transmission factor.
///
/// Condensed diurnal model: a sunspot-scaled day peak and night floor
/// blended by the solar elevation, with an exponential relaxation after
/// sunset and a high-latitude rolloff.
fn find_fof2(at: GeographicPoint, sun: &SolarPosition, hour_utc: f64, ssn: f64) -> (f64, f64) {
    let ssn_gain = (1.0 + 0.0074 * ssn).sqrt();
    let day_peak = 9.5 * ssn_gain;
    let night_floor = 3.2 * ssn_gain;

    let g = if sun.is_day() {
        f64::powf(f64::cos(sun.zenith_angle).max(0.0), 0.4)
    } else {
        let h = sun.hours_after_sunset(hour_utc);
        f64::powf(f64::cos(89.0 * D2R), 0.4) * f64::exp(-h / F2_DECAY_HOURS)
    };

    let lat_factor = 1.0 - 0.3 * (at.lat.abs() / (90.0 * D2R)).powi(2);
    let fof2 = (night_floor + (day_peak - night_floor) * g) * lat_factor;

    // The layer sits higher at night: lower transmission factor.
    let m3000 = 2.65 + 0.45 * g;
    (fof2, m3000)
}

/// F1 critical frequency; the layer only exists under a lit ionosphere.
fn find_fof1(sun: &SolarPosition, ssn: f64) -> Option<f64> {
    if sun.zenith_angle >= 85.0 * D2R {
        return None;
    }
    Some((4.3 + 0.01 * ssn.min(FOE_MAX_SSN)) * f64::powf(f64::cos(sun.zenith_angle), 0.2))
}

/// An externally supplied, hour-invariant profile.
#[derive(Debug, Clone, Copy)]
pub struct FixedIonosphere {
    pub profile: LayerProfile,
}

impl IonosphereModel for FixedIonosphere {
    fn layers(&self, _at: GeographicPoint, _m: u32, _h: u32, _i: SolarIndices) -> LayerProfile {
        self.profile
    }
}
