//! Shared constants for the prediction core.

pub const R0: f64 = 6371.009; // km International Union of Geodesy and Geophysics mean Earth radius
pub const D2R: f64 = 0.0174532925; // PI/180
pub const R2D: f64 = 57.2957795; // 180/PI

// HF band limits (MHz)
pub const BAND_MIN_MHZ: f64 = 3.0;
pub const BAND_MAX_MHZ: f64 = 30.0;

// Maximum hop counts searched per layer
pub const MAX_F2_HOPS: usize = 6;
pub const MAX_F1_HOPS: usize = 2;
pub const MAX_E_HOPS: usize = 3;

// Longest ground range a single hop may cover (km)
pub const MAX_HOP_RANGE_KM: f64 = 4000.0;

// Minimum takeoff elevation angle (degrees)
pub const MIN_ELEVATION_DEG: f64 = 3.0;

// Iteration cap for the mirror-height fixed point
pub const SOLVER_MAX_ITERATIONS: usize = 30;

// Convergence tolerance on the solved mirror height (km)
pub const SOLVER_HEIGHT_TOLERANCE_KM: f64 = 0.5;

// Ceiling on solved virtual heights (km)
pub const VIRTUAL_HEIGHT_MAX_KM: f64 = 600.0;

// Saturation of the vertical-to-critical frequency ratio inside the
// virtual-height relation; keeps over-the-MUF geometry defined.
pub const MAX_REFLECTION_RATIO: f64 = 0.98;

// E-layer reference height (km) used for screening and absorption
pub const E_HEIGHT_KM: f64 = 110.0;

// Margin applied to foE when testing whether the E layer blocks an
// F2 ray on its way up
pub const E_SCREENING_FACTOR: f64 = 1.05;

// System loss not otherwise modeled (dB)
pub const RESIDUAL_LOSS_DB: f64 = 9.14;

// Optimum working frequency as a fraction of the circuit MUF. Fixed by the
// validated reference behavior; not a tunable.
pub const FOT_FRACTION: f64 = 0.85;

/// Decile z-value of the standard normal distribution, the 90th-percentile
/// point. This single canonical value feeds both coupled positions in the
/// statistics chain; see [`Z_DECILE_SIGMA`] and [`Z_DECILE_SCALE`].
pub const Z_DECILE: f64 = 1.281551565545;

/// Position one: converts a decile deviation into the sigma of a day-to-day
/// normal. Must stay identical to [`Z_DECILE_SCALE`]; the pair is validated
/// by a dedicated regression test and must never be retuned independently.
pub const Z_DECILE_SIGMA: f64 = Z_DECILE;

/// Position two: scales the z-score in the exceedance mapping. Must stay
/// identical to [`Z_DECILE_SIGMA`].
pub const Z_DECILE_SCALE: f64 = Z_DECILE;

// Receiver reference: 10 log10(k T0) for 1 Hz, dBW
pub const KT0_DBW: f64 = -204.0;
