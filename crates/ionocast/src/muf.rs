//! Circuit MUF statistics: the dominant-mode median MUF, the operational
//! MUF, the optimum working frequency and the day-to-day probability that
//! an operating frequency is still under the MUF.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::constants::*;
use crate::ionosphere::Layer;
use crate::loss::LossContext;
use crate::path::Season;
use crate::reflectrix::{Mode, ModeId};
use crate::stats::exceedance_probability;

/// Basic MUF of one solved ray: the critical frequency carried to oblique
/// incidence by the secant factor.
pub fn basic_muf(critical_frequency_mhz: f64, secant_factor: f64) -> f64 {
    critical_frequency_mhz * secant_factor
}

/// Day-to-day MUF decile factors relative to the median.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MufDeciles {
    pub lower: f64,
    pub upper: f64,
}

// The E-layer MUF varies little from day to day.
const E_DECILES: MufDeciles = MufDeciles {
    lower: 0.95,
    upper: 1.05,
};

// F-layer decile factors by season and [day, night]. Scatter is widest on
// winter nights and grows again poleward of 60 degrees geomagnetic.
const F_DECILE_LOWER: [[f64; 2]; 3] = [
    [0.77, 0.72], // winter
    [0.80, 0.76], // equinox
    [0.83, 0.78], // summer
];
const F_DECILE_UPPER: [[f64; 2]; 3] = [
    [1.22, 1.33],
    [1.17, 1.26],
    [1.14, 1.20],
];
const HIGH_LAT_WIDENING: f64 = 0.05;

fn f_layer_deciles(season: Season, is_day: bool, magnetic_lat: f64) -> MufDeciles {
    let col = usize::from(!is_day);
    let mut lower = F_DECILE_LOWER[season as usize][col];
    let mut upper = F_DECILE_UPPER[season as usize][col];
    if magnetic_lat.abs() >= 60.0 * D2R {
        lower -= HIGH_LAT_WIDENING;
        upper += HIGH_LAT_WIDENING;
    }
    MufDeciles { lower, upper }
}

// Ratio of the median operational MUF to the median basic MUF for F modes,
// [EIRP band][season][day, night]. E modes take no operational uplift.
const ROP: [[[f64; 2]; 3]; 2] = [
    // EIRP <= 30 dBW
    [
        [1.20, 1.30], // winter
        [1.15, 1.25], // equinox
        [1.10, 1.20], // summer
    ],
    // EIRP > 30 dBW
    [
        [1.15, 1.25],
        [1.20, 1.30],
        [1.25, 1.35],
    ],
];

const ROP_EIRP_SPLIT_DBW: f64 = 30.0;

/// MUF statistics for one circuit hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MufResult {
    /// Median circuit MUF: the dominant mode's basic MUF.
    pub circuit_muf_mhz: f64,
    /// Median MUF uplifted by the operational ratio.
    pub operational_muf_mhz: f64,
    /// Optimum working frequency.
    pub fot_mhz: f64,
    pub dominant_mode: ModeId,
    pub deciles: MufDeciles,
}

/// The mode whose basic MUF defines the circuit MUF.
///
/// Dominance prefers the higher basic MUF; at equal MUF the mode with
/// fewer hops wins, since fewer hops means less loss at the same
/// frequency headroom. `None` when no mode solved this hour.
pub fn dominant_mode(modes: &[Mode]) -> Option<&Mode> {
    modes.iter().max_by(|a, b| {
        a.basic_muf_mhz
            .partial_cmp(&b.basic_muf_mhz)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.hop_count().cmp(&a.hop_count()))
    })
}

impl MufResult {
    /// Select the dominant mode and derive the circuit statistics.
    /// `None` when no mode solved this hour.
    pub fn from_modes(modes: &[Mode], ctx: &LossContext, eirp_dbw: f64) -> Option<Self> {
        Some(Self::from_dominant(dominant_mode(modes)?, ctx, eirp_dbw))
    }

    /// Circuit statistics once the dominant mode is known. `eirp_dbw` keys
    /// the operational-MUF power band and is the transmitter gain toward the
    /// dominant mode's takeoff elevation on top of the transmit power.
    pub fn from_dominant(dominant: &Mode, ctx: &LossContext, eirp_dbw: f64) -> Self {
        let is_day = ctx.sun.is_day();
        let deciles = match dominant.layer() {
            Layer::E => E_DECILES,
            Layer::F1 | Layer::F2 => f_layer_deciles(ctx.season, is_day, ctx.max_magnetic_lat),
        };
        let rop = match dominant.layer() {
            Layer::E => 1.0,
            Layer::F1 | Layer::F2 => {
                let band = usize::from(eirp_dbw > ROP_EIRP_SPLIT_DBW);
                ROP[band][ctx.season as usize][usize::from(!is_day)]
            }
        };

        let circuit_muf_mhz = dominant.basic_muf_mhz;
        Self {
            circuit_muf_mhz,
            operational_muf_mhz: circuit_muf_mhz * rop,
            fot_mhz: circuit_muf_mhz * FOT_FRACTION,
            dominant_mode: dominant.id,
            deciles,
        }
    }

    /// Probability that the MUF on a given day exceeds `frequency_mhz`.
    ///
    /// The decile offset on the operating side of the median is normalized
    /// to a sigma with [`Z_DECILE_SIGMA`]; the z-score scaling in the
    /// reliability mapping uses [`Z_DECILE_SCALE`]. The two are one
    /// canonical pair and must move together.
    pub fn muf_day_probability(&self, frequency_mhz: f64) -> f64 {
        let m = self.circuit_muf_mhz;
        let spread_mhz = if frequency_mhz >= m {
            m * (self.deciles.upper - 1.0)
        } else {
            m * (1.0 - self.deciles.lower)
        };
        let sigma = spread_mhz / Z_DECILE_SIGMA;
        if sigma <= 0.0 {
            return if frequency_mhz > m { 0.0 } else { 1.0 };
        }
        exceedance_probability((frequency_mhz - m) / sigma)
    }
}
