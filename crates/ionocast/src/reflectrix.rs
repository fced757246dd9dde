//! Ray-mode search: which (layer, hop count) geometries connect the two
//! ends of the circuit this hour, and at what loss.
//!
//! Each candidate hop is solved as a mirror reflection off a
//! quasi-parabolic layer: the mirror height must equal the virtual height
//! the layer presents at the ray's oblique frequency. The residual of that
//! relation brackets a sign change between the layer base and the height
//! ceiling, so a capped bisection settles it. Candidates die on hop range,
//! takeoff elevation, E-layer screening or a failed solve; an operating
//! frequency above the mode's MUF is not fatal and is charged as excess
//! loss instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

use crate::constants::*;
use crate::ionosphere::{Layer, LayerProfile, LayerState};
use crate::loss::{self, LossBreakdown, LossContext};
use crate::muf;
use crate::path::{elevation_angle, incidence_angle, PathGeometry};

/// Identifies a propagation mode, printed hop count first: `2F2`, `1E`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModeId {
    pub layer: Layer,
    pub hop_count: usize,
}

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.hop_count, self.layer)
    }
}

/// One valid propagation mode with its solved geometry and loss stack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mode {
    pub id: ModeId,
    /// Takeoff elevation (radians).
    pub elevation: f64,
    /// Mirror height the solver settled on (km).
    pub virtual_height_km: f64,
    /// Secant of the incidence angle at the reflection height.
    pub secant_factor: f64,
    /// Highest frequency this geometry supports (MHz).
    pub basic_muf_mhz: f64,
    pub loss: LossBreakdown,
}

impl Mode {
    pub fn layer(&self) -> Layer {
        self.id.layer
    }

    pub fn hop_count(&self) -> usize {
        self.id.hop_count
    }
}

/// Solved one-hop ray geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayGeometry {
    pub elevation: f64,
    pub virtual_height_km: f64,
    pub secant_factor: f64,
}

/// Search every (layer, hop count) pair for valid modes at one frequency.
///
/// E and F1 reflections are only searched when the whole path fits in a
/// single maximum-length hop; beyond that the low layers cannot carry a
/// usable ray and only F2 candidates remain.
pub fn find_modes(
    path: &PathGeometry,
    profile: &LayerProfile,
    frequency_mhz: f64,
    ctx: &LossContext,
) -> Vec<Mode> {
    let distance_km = path.distance_km();
    let mut modes = Vec::new();

    for layer in [Layer::E, Layer::F1, Layer::F2] {
        let state = match profile.get(layer) {
            Some(state) => state,
            None => continue,
        };
        if layer != Layer::F2 && distance_km > MAX_HOP_RANGE_KM {
            continue;
        }

        for hop_count in 1..=layer.max_hops() {
            let hop_range_km = distance_km / hop_count as f64;
            let ray = match solve_hop_geometry(hop_range_km, layer, state, frequency_mhz) {
                Some(ray) => ray,
                None => {
                    trace!(?layer, hop_count, hop_range_km, "no ray geometry");
                    continue;
                }
            };
            if layer == Layer::F2 && screened_by_e(profile, ray.elevation, frequency_mhz) {
                trace!(hop_count, "F2 ray screened by the E layer");
                continue;
            }

            let basic_muf_mhz = muf::basic_muf(state.critical_frequency_mhz, ray.secant_factor);
            let loss = loss::mode_loss(
                ctx,
                layer,
                frequency_mhz,
                hop_range_km,
                ray.elevation,
                hop_count,
                basic_muf_mhz,
            );
            modes.push(Mode {
                id: ModeId { layer, hop_count },
                elevation: ray.elevation,
                virtual_height_km: ray.virtual_height_km,
                secant_factor: ray.secant_factor,
                basic_muf_mhz,
                loss,
            });
        }
    }
    modes
}

/// Solve the coupled elevation / virtual-height relation for one hop
/// against a quasi-parabolic layer. `None` when the hop is out of range,
/// the ray would leave below the minimum elevation, or the capped search
/// does not settle.
pub fn solve_hop_geometry(
    hop_range_km: f64,
    layer: Layer,
    state: LayerState,
    frequency_mhz: f64,
) -> Option<RayGeometry> {
    if hop_range_km <= 0.0 || hop_range_km > MAX_HOP_RANGE_KM {
        return None;
    }

    let ym = layer.semi_thickness_km();
    let base_km = f64::max(state.reflection_height_km - ym, 50.0);

    // Virtual height the layer presents to a ray mirrored at `height_km`.
    let virtual_height = |height_km: f64| -> f64 {
        let elevation = elevation_angle(hop_range_km, height_km);
        let aoi = incidence_angle(elevation, height_km);
        let fv = frequency_mhz * aoi.cos();
        let ratio = f64::min(fv / state.critical_frequency_mhz, MAX_REFLECTION_RATIO);
        let retardation = 0.5 * ym * ratio * f64::ln((1.0 + ratio) / (1.0 - ratio));
        f64::min(base_km + retardation, VIRTUAL_HEIGHT_MAX_KM)
    };

    // The residual is positive at the layer base and non-positive at the
    // ceiling, so the bracket holds from the start.
    let mut lo = base_km;
    let mut hi = VIRTUAL_HEIGHT_MAX_KM;
    let mut height_km = 0.5 * (lo + hi);
    let mut converged = false;
    for _ in 0..SOLVER_MAX_ITERATIONS {
        if virtual_height(height_km) > height_km {
            lo = height_km;
        } else {
            hi = height_km;
        }
        let next = 0.5 * (lo + hi);
        if (next - height_km).abs() < SOLVER_HEIGHT_TOLERANCE_KM {
            height_km = next;
            converged = true;
            break;
        }
        height_km = next;
    }
    if !converged {
        return None;
    }

    let elevation = elevation_angle(hop_range_km, height_km);
    if elevation < MIN_ELEVATION_DEG * D2R {
        return None;
    }
    let aoi = incidence_angle(elevation, height_km);
    Some(RayGeometry {
        elevation,
        virtual_height_km: height_km,
        secant_factor: 1.0 / aoi.cos(),
    })
}

/// A rising F2 ray is blocked when the obliquely-scaled foE at the
/// screening height reaches the operating frequency.
fn screened_by_e(profile: &LayerProfile, elevation: f64, frequency_mhz: f64) -> bool {
    let aoi = incidence_angle(elevation, E_HEIGHT_KM);
    let fs = E_SCREENING_FACTOR * profile.e.critical_frequency_mhz / aoi.cos();
    frequency_mhz <= fs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::GeographicPoint;

    fn path_between(lon_east_deg: f64) -> PathGeometry {
        let tx = GeographicPoint::from_degrees(40.0, -105.0).unwrap();
        let rx = GeographicPoint::from_degrees(40.0, lon_east_deg).unwrap();
        PathGeometry::new(tx, rx).unwrap()
    }

    fn quiet_profile() -> LayerProfile {
        LayerProfile {
            e: LayerState {
                critical_frequency_mhz: 3.0,
                reflection_height_km: 110.0,
            },
            f1: Some(LayerState {
                critical_frequency_mhz: 4.5,
                reflection_height_km: 200.0,
            }),
            f2: LayerState {
                critical_frequency_mhz: 8.0,
                reflection_height_km: 300.0,
            },
        }
    }

    fn ctx_for(path: &PathGeometry, profile: &LayerProfile) -> LossContext {
        LossContext::new(path, profile, 6, 18, 100.0).unwrap()
    }

    #[test]
    fn single_hop_f2_solves_at_mid_range() {
        let ray = solve_hop_geometry(
            1300.0,
            Layer::F2,
            quiet_profile().f2,
            10.0,
        )
        .unwrap();
        assert!(ray.elevation > MIN_ELEVATION_DEG * D2R);
        assert!(ray.elevation < 90.0 * D2R);
        assert!(ray.virtual_height_km > 200.0 && ray.virtual_height_km < 300.0);
        assert!(ray.secant_factor > 1.0);
    }

    #[test]
    fn steeper_hops_leave_at_higher_elevation() {
        let far = solve_hop_geometry(1300.0, Layer::F2, quiet_profile().f2, 10.0).unwrap();
        let near = solve_hop_geometry(400.0, Layer::F2, quiet_profile().f2, 10.0).unwrap();
        assert!(near.elevation > far.elevation);
        assert!(near.secant_factor < far.secant_factor);
    }

    #[test]
    fn out_of_range_hops_are_rejected() {
        assert!(solve_hop_geometry(4500.0, Layer::F2, quiet_profile().f2, 10.0).is_none());
        assert!(solve_hop_geometry(0.0, Layer::F2, quiet_profile().f2, 10.0).is_none());
    }

    #[test]
    fn mid_path_sees_modes_from_every_layer() {
        let path = path_between(-90.2); // ~1280 km
        let profile = quiet_profile();
        let ctx = ctx_for(&path, &profile);
        let modes = find_modes(&path, &profile, 10.0, &ctx);
        assert!(modes.iter().any(|m| m.id == ModeId { layer: Layer::F2, hop_count: 1 }));
        assert!(modes.iter().any(|m| m.layer() == Layer::E));
        for mode in &modes {
            assert!(mode.elevation >= MIN_ELEVATION_DEG * D2R);
            assert!(mode.basic_muf_mhz > 0.0);
            assert!(mode.loss.total_db > 0.0);
        }
    }

    #[test]
    fn long_paths_drop_low_layers_and_short_hop_counts() {
        let path = path_between(-30.0); // ~6180 km
        let profile = quiet_profile();
        let ctx = ctx_for(&path, &profile);
        let modes = find_modes(&path, &profile, 14.0, &ctx);
        assert!(!modes.is_empty());
        assert!(modes.iter().all(|m| m.layer() == Layer::F2));
        assert!(modes.iter().all(|m| m.hop_count() >= 2));
    }

    #[test]
    fn flat_e_rays_near_the_range_limit_are_rejected() {
        let path = path_between(-58.0); // ~3950 km, inside the E search range
        let profile = quiet_profile();
        let ctx = ctx_for(&path, &profile);
        let modes = find_modes(&path, &profile, 10.0, &ctx);
        assert!(!modes.iter().any(|m| m.id == ModeId { layer: Layer::E, hop_count: 1 }));
        assert!(!modes.iter().any(|m| m.id == ModeId { layer: Layer::E, hop_count: 2 }));
        assert!(modes.iter().any(|m| m.id == ModeId { layer: Layer::E, hop_count: 3 }));
    }

    #[test]
    fn strong_e_screens_f2_until_frequency_clears_it() {
        let profile = LayerProfile {
            e: LayerState {
                critical_frequency_mhz: 9.0,
                reflection_height_km: 110.0,
            },
            f1: None,
            f2: LayerState {
                critical_frequency_mhz: 7.0,
                reflection_height_km: 300.0,
            },
        };
        let path = path_between(-75.0); // ~2540 km
        let ctx = ctx_for(&path, &profile);

        // 10 MHz sits under the obliquely-scaled foE for every hop count;
        // even the steepest ray stays blocked.
        let blocked = find_modes(&path, &profile, 10.0, &ctx);
        assert!(blocked.iter().all(|m| m.layer() != Layer::F2));
        assert!(blocked.iter().any(|m| m.layer() == Layer::E));

        let cleared = find_modes(&path, &profile, 29.0, &ctx);
        assert!(cleared.iter().any(|m| m.layer() == Layer::F2));
    }

    #[test]
    fn over_muf_modes_survive_with_excess_loss() {
        let path = path_between(-90.2);
        let profile = quiet_profile();
        let ctx = ctx_for(&path, &profile);

        let below = find_modes(&path, &profile, 10.0, &ctx);
        let above = find_modes(&path, &profile, 28.0, &ctx);

        let f2_below = below
            .iter()
            .find(|m| m.id == ModeId { layer: Layer::F2, hop_count: 1 })
            .unwrap();
        assert_eq!(f2_below.loss.excess_db, 0.0);

        let f2_above = above
            .iter()
            .find(|m| m.id == ModeId { layer: Layer::F2, hop_count: 1 })
            .unwrap();
        assert!(f2_above.basic_muf_mhz < 28.0);
        assert!(f2_above.loss.excess_db > 0.0);
    }

    #[test]
    fn search_is_deterministic() {
        let path = path_between(-90.2);
        let profile = quiet_profile();
        let ctx = ctx_for(&path, &profile);
        let first = find_modes(&path, &profile, 18.0, &ctx);
        let second = find_modes(&path, &profile, 18.0, &ctx);
        assert_eq!(first, second);
    }
}
