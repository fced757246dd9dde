//! Staged path loss for one propagation mode.
//!
//! Every mode pays free-space spreading over its slant distance plus
//! D-region absorption on each transit; multi-hop modes add ground
//! reflections, high-magnetic-latitude paths add an auroral term, and
//! frequencies beyond what the geometry supports add the excess penalty
//! instead of disqualifying the mode. The absorption term keeps the
//! noon-referenced three-factor form: a latitude-dependent noon factor, a
//! penetration factor in the ratio of vertical-incidence frequency to foE,
//! and a solar-zenith diurnal ratio.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ConfigError;
use crate::ionosphere::{Layer, LayerProfile};
use crate::path::{incidence_angle, slant_range, PathGeometry, Season};
use crate::solar::{solar_position, SolarPosition};

/// Loss terms for one mode, all in dB; `total_db` is their sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossBreakdown {
    pub free_space_db: f64,
    pub absorption_db: f64,
    pub ground_db: f64,
    pub auroral_db: f64,
    pub excess_db: f64,
    pub residual_db: f64,
    pub total_db: f64,
}

/// Per-hour inputs shared by every mode evaluated for one circuit: solar
/// geometry at the path midpoint, the E-layer critical frequency, the
/// magnetic-latitude keys and the season/local-time keys of the auroral
/// table.
#[derive(Debug, Clone, Copy)]
pub struct LossContext {
    pub ssn: f64,
    pub sun: SolarPosition,
    /// Solar zenith angle at local solar noon (radians).
    pub noon_zenith: f64,
    pub foe_mhz: f64,
    /// Longitudinal electron gyrofrequency at the absorption height (MHz).
    pub gyro_mhz: f64,
    /// Geographic latitude of the path midpoint (radians).
    pub midpoint_lat: f64,
    /// Largest absolute geomagnetic latitude along the path (radians).
    pub max_magnetic_lat: f64,
    pub season: Season,
    /// Mean local time at the path midpoint, fractional hours.
    pub local_time: f64,
}

impl LossContext {
    pub fn new(
        path: &PathGeometry,
        profile: &LayerProfile,
        month: u32,
        hour_utc: u32,
        ssn: f64,
    ) -> Result<Self, ConfigError> {
        if !(1..=12).contains(&month) {
            return Err(ConfigError::InvalidMonth(month));
        }
        let mid = path.midpoint();
        let sun = solar_position(mid, month, f64::from(hour_utc));
        let noon = solar_position(mid, month, sun.noon_utc);
        Ok(Self {
            ssn,
            sun,
            noon_zenith: noon.zenith_angle,
            foe_mhz: profile.e.critical_frequency_mhz,
            gyro_mhz: longitudinal_gyrofrequency(mid.geomagnetic_lat()),
            midpoint_lat: mid.lat,
            max_magnetic_lat: path.max_geomagnetic_lat(),
            season: path.season(month)?,
            local_time: mid.local_mean_time(hour_utc),
        })
    }
}

/// Assemble the loss stack for one candidate mode.
pub fn mode_loss(
    ctx: &LossContext,
    layer: Layer,
    frequency_mhz: f64,
    hop_range_km: f64,
    elevation: f64,
    hop_count: usize,
    basic_muf_mhz: f64,
) -> LossBreakdown {
    let slant_km = slant_range(hop_range_km, elevation, hop_count);
    let free_space_db = free_space_loss(frequency_mhz, slant_km);
    let absorption_db = absorption_loss(ctx, frequency_mhz, elevation, hop_count);
    let ground_db = ground_reflection_loss(hop_count);
    let auroral_db = auroral_loss(ctx, hop_range_km);
    let distance_km = hop_range_km * hop_count as f64;
    let excess_db = excess_loss(layer, frequency_mhz, basic_muf_mhz, hop_count, distance_km);
    let residual_db = RESIDUAL_LOSS_DB;
    LossBreakdown {
        free_space_db,
        absorption_db,
        ground_db,
        auroral_db,
        excess_db,
        residual_db,
        total_db: free_space_db + absorption_db + ground_db + auroral_db + excess_db + residual_db,
    }
}

/// Free-space spreading loss over the slant distance.
pub fn free_space_loss(frequency_mhz: f64, slant_km: f64) -> f64 {
    32.45 + 20.0 * frequency_mhz.log10() + 20.0 * slant_km.log10()
}

/// D-region absorption accumulated over `hop_count` layer transits.
///
/// The vertical-incidence frequency and the secant correction are both
/// taken at the absorption height, not the reflection height, so E and F
/// modes share one formula.
pub fn absorption_loss(
    ctx: &LossContext,
    frequency_mhz: f64,
    elevation: f64,
    hop_count: usize,
) -> f64 {
    let aoi = incidence_angle(elevation, E_HEIGHT_KM);
    let fv = frequency_mhz * aoi.cos();
    let p = diurnal_exponent(ctx.midpoint_lat);
    let diurnal = zenith_factor(ctx.sun.zenith_angle, p) / zenith_factor(ctx.noon_zenith, p);
    let at = noon_absorption_factor(ctx.midpoint_lat) * penetration_factor(fv / ctx.foe_mhz) * diurnal;
    let f_eff = frequency_mhz + ctx.gyro_mhz;
    hop_count as f64 * (1.0 + 0.0067 * ctx.ssn) * at / (f_eff * f_eff * aoi.cos())
}

/// Intermediate ground reflections, 2 dB per bounce.
pub fn ground_reflection_loss(hop_count: usize) -> f64 {
    2.0 * hop_count.saturating_sub(1) as f64
}

// Auroral and polar signal loss (dB), condensed to four geomagnetic-latitude
// bands (>= 72.5, 62.5, 52.5, 42.5 degrees) by four local-time blocks
// (22-03, 04-09, 10-15, 16-21 h) per season.
const AURORAL_DB: [[[f64; 4]; 4]; 3] = [
    // Winter
    [
        [2.4, 7.4, 0.9, 2.1],
        [6.2, 14.6, 2.4, 7.0],
        [1.6, 3.8, 0.7, 2.5],
        [0.6, 1.1, 0.2, 1.0],
    ],
    // Equinox
    [
        [3.8, 8.1, 3.1, 3.7],
        [10.5, 15.4, 7.4, 9.0],
        [3.6, 4.7, 3.2, 4.3],
        [1.4, 1.7, 1.3, 1.7],
    ],
    // Summer
    [
        [3.2, 2.4, 2.6, 4.3],
        [6.9, 6.1, 4.8, 7.9],
        [3.7, 2.7, 2.7, 5.7],
        [1.6, 1.1, 1.2, 2.4],
    ],
];

// Hops longer than this see the reduced auroral value.
const AURORAL_LONG_HOP_KM: f64 = 2500.0;
const AURORAL_LONG_HOP_FACTOR: f64 = 0.65;

/// Signal loss in and near the auroral zones. Zero equatorward of 42.5
/// degrees geomagnetic.
pub fn auroral_loss(ctx: &LossContext, hop_range_km: f64) -> f64 {
    let gl = ctx.max_magnetic_lat.abs();
    let band = if gl >= 72.5 * D2R {
        0
    } else if gl >= 62.5 * D2R {
        1
    } else if gl >= 52.5 * D2R {
        2
    } else if gl >= 42.5 * D2R {
        3
    } else {
        return 0.0;
    };
    let block = match ctx.local_time as u32 % 24 {
        22 | 23 | 0..=3 => 0,
        4..=9 => 1,
        10..=15 => 2,
        _ => 3,
    };
    let mut lh = AURORAL_DB[ctx.season as usize][band][block];
    if hop_range_km > AURORAL_LONG_HOP_KM {
        lh *= AURORAL_LONG_HOP_FACTOR;
    }
    lh
}

/// Loss added when the operating frequency exceeds what the mode geometry
/// supports. The mode stays usable with a degraded signal; every hop pays
/// the penalty.
pub fn excess_loss(
    layer: Layer,
    frequency_mhz: f64,
    basic_muf_mhz: f64,
    hop_count: usize,
    distance_km: f64,
) -> f64 {
    if basic_muf_mhz <= 0.0 || frequency_mhz <= basic_muf_mhz {
        return 0.0;
    }
    let over = frequency_mhz / basic_muf_mhz - 1.0;
    let per_hop = match layer {
        Layer::E => f64::min(46.0 * over.sqrt() + 5.0, 58.0),
        Layer::F1 | Layer::F2 => {
            if distance_km <= 3000.0 {
                f64::min(36.0 * over.sqrt() + 5.0, 60.0)
            } else {
                f64::min(70.0 * over + 8.0, 80.0)
            }
        }
    };
    hop_count as f64 * per_hop
}

// Noon absorption factor against |geographic latitude|, ten-degree steps
// from the equator.
const NOON_ABSORPTION: [f64; 8] = [335.0, 300.0, 310.0, 340.0, 350.0, 285.0, 205.0, 125.0];

fn noon_absorption_factor(lat: f64) -> f64 {
    let x = (lat.abs() * R2D / 10.0).min(6.99);
    let i = x as usize;
    let frac = x - i as f64;
    NOON_ABSORPTION[i] * (1.0 - frac) + NOON_ABSORPTION[i + 1] * frac
}

// Absorption-layer penetration factor against fv/foE, normalized so the
// high-ratio tail is 1. Piecewise linear through the knee and the peak.
const PENETRATION_KNOTS: [(f64, f64); 6] = [
    (0.0, 0.38),
    (0.5, 0.70),
    (1.1, 1.48),
    (1.65, 1.10),
    (2.2, 1.06),
    (10.0, 1.0),
];

fn penetration_factor(ratio: f64) -> f64 {
    if ratio <= PENETRATION_KNOTS[0].0 {
        return PENETRATION_KNOTS[0].1;
    }
    for pair in PENETRATION_KNOTS.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if ratio <= x1 {
            return y0 + (y1 - y0) * (ratio - x0) / (x1 - x0);
        }
    }
    PENETRATION_KNOTS[PENETRATION_KNOTS.len() - 1].1
}

// Diurnal absorption exponent, low near the equator and saturating toward
// mid-latitudes.
fn diurnal_exponent(lat: f64) -> f64 {
    0.7 + 0.8 * f64::min(lat.abs() / (50.0 * D2R), 1.0)
}

// cos^p of the compressed solar zenith angle, floored so absorption never
// vanishes entirely after dark.
fn zenith_factor(zenith: f64, p: f64) -> f64 {
    let chi = f64::min(zenith, 102.0 * D2R);
    f64::max(f64::cos(0.881 * chi).powf(p), 0.02)
}

/// Longitudinal electron gyrofrequency (MHz) at the absorption height for a
/// dipole field.
fn longitudinal_gyrofrequency(magnetic_lat: f64) -> f64 {
    let r = (R0 + E_HEIGHT_KM) / R0;
    let fh = 0.88 / (r * r * r) * f64::sqrt(1.0 + 3.0 * magnetic_lat.sin().powi(2));
    let dip = f64::atan(2.0 * magnetic_lat.tan());
    fh * dip.sin().abs()
}
