//! Great-circle path geometry on the curved earth.
//!
//! Everything the ray search needs from the ground track lives here: terminal
//! coordinates, hop splitting, the elevation and incidence relations of a
//! mirror reflection, and the geomagnetic coordinates that key the auroral
//! and variability tables.

use crate::constants::*;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub use noisefloor::Season;

/// A point on the earth in radians. North and east are positive.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeographicPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeographicPoint {
    pub fn from_degrees(lat_deg: f64, lon_deg: f64) -> Result<Self, ConfigError> {
        if !lat_deg.is_finite() || lat_deg.abs() > 90.0 {
            return Err(ConfigError::InvalidLatitude(lat_deg));
        }
        Ok(Self {
            lat: lat_deg * D2R,
            lon: lon_deg * D2R,
        })
    }

    /// Geomagnetic latitude of this point, radians.
    ///
    /// Uses the dipole pole position the auroral-zone coefficients were
    /// derived against (78.5 N, 68.2 W).
    pub fn geomagnetic_lat(&self) -> f64 {
        let pole_lat = 78.5 * D2R;
        let pole_lon = -68.2 * D2R;
        f64::asin(
            f64::sin(self.lat) * f64::sin(pole_lat)
                + f64::cos(self.lat) * f64::cos(pole_lat) * f64::cos(self.lon - pole_lon),
        )
    }

    /// Local mean time at this longitude for a UTC hour, in fractional hours.
    pub fn local_mean_time(&self, hour_utc: u32) -> f64 {
        let mut lmt = hour_utc as f64 + self.lon * R2D / 15.0;
        while lmt < 0.0 {
            lmt += 24.0;
        }
        while lmt >= 24.0 {
            lmt -= 24.0;
        }
        lmt
    }
}

/// Great-circle distance between two points, km.
pub fn great_circle_distance(here: GeographicPoint, there: GeographicPoint) -> f64 {
    2.0 * R0
        * f64::asin(f64::sqrt(
            f64::powi(f64::sin((here.lat - there.lat) / 2.0), 2)
                + f64::cos(here.lat)
                    * f64::cos(there.lat)
                    * f64::powi(f64::sin((here.lon - there.lon) / 2.0), 2),
        ))
}

/// The point a fraction of the way along the great circle from here to there.
pub fn great_circle_point(
    here: GeographicPoint,
    there: GeographicPoint,
    distance: f64,
    fraction: f64,
) -> GeographicPoint {
    if distance == 0.0 {
        return here;
    }
    let d = distance / R0;
    let a = f64::sin((1.0 - fraction) * d) / f64::sin(d);
    let b = f64::sin(fraction * d) / f64::sin(d);
    let x = a * f64::cos(here.lat) * f64::cos(here.lon) + b * f64::cos(there.lat) * f64::cos(there.lon);
    let y = a * f64::cos(here.lat) * f64::sin(here.lon) + b * f64::cos(there.lat) * f64::sin(there.lon);
    let z = a * f64::sin(here.lat) + b * f64::sin(there.lat);
    GeographicPoint {
        lat: f64::atan2(z, f64::sqrt(x.powi(2) + y.powi(2))),
        lon: f64::atan2(y, x),
    }
}

/// Bearing from here to there, radians clockwise from north.
pub fn bearing(here: GeographicPoint, there: GeographicPoint) -> f64 {
    let numerator = f64::sin(there.lon - here.lon) * f64::cos(there.lat);
    let denominator = f64::cos(here.lat) * f64::sin(there.lat)
        - f64::sin(here.lat) * f64::cos(there.lat) * f64::cos(there.lon - here.lon);
    (2.0 * PI + f64::atan2(numerator, denominator)) % (2.0 * PI)
}

/// Takeoff elevation of a ray that mirror-reflects at height `hr` km and
/// lands `hop_range` km downrange, radians. Negative when the geometry asks
/// for a launch below the horizon.
pub fn elevation_angle(hop_range: f64, hr: f64) -> f64 {
    let half = hop_range / (2.0 * R0);
    f64::atan(1.0 / f64::tan(half) - R0 / ((R0 + hr) * f64::sin(half)))
}

/// Angle of incidence at height `hr` km for a ray launched at `elevation`
/// radians, measured from the local vertical.
pub fn incidence_angle(elevation: f64, hr: f64) -> f64 {
    f64::asin(R0 * f64::cos(elevation) / (R0 + hr))
}

/// Slant range of `hops` mirror hops covering `hop_range` km each at
/// elevation `elevation`, km.
pub fn slant_range(hop_range: f64, elevation: f64, hops: usize) -> f64 {
    let psi = hop_range / (2.0 * R0);
    f64::abs(2.0 * R0 * f64::sin(psi) / f64::cos(elevation + psi)) * hops as f64
}

/// One candidate hop split of the path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HopGeometry {
    pub hop_count: usize,
    pub ground_range_km: f64,
    /// Takeoff elevation implied by a nominal F-region mirror, radians.
    pub takeoff_elevation: f64,
}

/// Immutable description of the circuit ground track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathGeometry {
    tx: GeographicPoint,
    rx: GeographicPoint,
    distance_km: f64,
    midpoint: GeographicPoint,
}

// Nominal mirror height for the takeoff-elevation estimate, km.
const NOMINAL_F_HEIGHT_KM: f64 = 300.0;

impl PathGeometry {
    pub fn new(tx: GeographicPoint, rx: GeographicPoint) -> Result<Self, ConfigError> {
        let distance_km = great_circle_distance(tx, rx);
        if distance_km <= 0.0 {
            return Err(ConfigError::DegeneratePath);
        }
        let midpoint = great_circle_point(tx, rx, distance_km, 0.5);
        Ok(Self {
            tx,
            rx,
            distance_km,
            midpoint,
        })
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn transmitter(&self) -> GeographicPoint {
        self.tx
    }

    pub fn receiver(&self) -> GeographicPoint {
        self.rx
    }

    /// Path midpoint, the reference location for layer and noise lookups.
    pub fn midpoint(&self) -> GeographicPoint {
        self.midpoint
    }

    pub fn bearing(&self) -> f64 {
        bearing(self.tx, self.rx)
    }

    /// Split the path into `hop_count` equal hops.
    pub fn hop_geometry(&self, hop_count: usize) -> Result<HopGeometry, ConfigError> {
        if hop_count < 1 {
            return Err(ConfigError::InvalidHopCount(hop_count));
        }
        let ground_range_km = self.distance_km / hop_count as f64;
        Ok(HopGeometry {
            hop_count,
            ground_range_km,
            takeoff_elevation: elevation_angle(ground_range_km, NOMINAL_F_HEIGHT_KM),
        })
    }

    /// Highest geomagnetic latitude reached along the track, radians.
    /// Sampled at the terminals, midpoint and quarter points.
    pub fn max_geomagnetic_lat(&self) -> f64 {
        [0.0, 0.25, 0.5, 0.75, 1.0]
            .iter()
            .map(|&frac| {
                great_circle_point(self.tx, self.rx, self.distance_km, frac)
                    .geomagnetic_lat()
                    .abs()
            })
            .fold(0.0, f64::max)
    }

    /// Climatology season at the path midpoint.
    pub fn season(&self, month: u32) -> Result<Season, ConfigError> {
        Ok(Season::from_month_lat(month, self.midpoint.lat)?)
    }
}
