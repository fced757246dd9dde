//! Solar geometry at a point: declination, hour angle, zenith angle and the
//! local sunrise/sunset/noon times that drive E-layer ionization and
//! absorption. All calculations use the 15th day of the month, the reference
//! day of the monthly-median model.

use crate::constants::*;
use crate::path::GeographicPoint;
use std::f64::consts::PI;

/// Solar angles and event times for one (location, month, hour) triple.
/// Times are UTC fractional hours; angles are radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarPosition {
    pub declination: f64,
    pub hour_angle: f64,
    pub zenith_angle: f64,
    pub equation_of_time: f64, // minutes
    pub sunrise_utc: f64,
    pub sunset_utc: f64,
    pub noon_utc: f64,
}

// Cumulative day count at the start of each month.
const DAY_OF_YEAR: [i32; 12] = [0, 31, 59, 90, 120, 152, 181, 212, 243, 273, 304, 334];

const MEAN_DAILY_MOTION: f64 = 0.98565327; // degrees per day
const MINUTES_PER_DEGREE: f64 = 3.98891967;
const MARCH_EQUINOX_NU: f64 = 78.746118; // degrees

/// Solar position for the 15th of `month` (1..=12) at `hour_utc`.
pub fn solar_position(at: GeographicPoint, month: u32, hour_utc: f64) -> SolarPosition {
    let tilt_sin = f64::sin(23.45 * D2R);
    let tilt_cos = f64::cos(23.45 * D2R);

    let d = DAY_OF_YEAR[(month - 1) as usize] as f64 + 15.0 + hour_utc / 24.0;

    // Elliptic-orbit arc from perihelion (assumed January 2nd).
    let lambda = MEAN_DAILY_MOTION * D2R * (d - 2.0);
    let nu = lambda + 1.915169 * D2R * f64::sin(lambda);

    // Mean sun angle after the March equinox, wrapped to +/- pi/2.
    let mut epsilon = MEAN_DAILY_MOTION * D2R * (d - 80.0);
    if epsilon >= 270.0 * D2R {
        epsilon -= 2.0 * PI;
    } else if epsilon >= 90.0 * D2R {
        epsilon -= PI;
    }
    let beta = f64::atan(tilt_cos * f64::tan(epsilon));

    // Equation of time: tilt effect plus elliptic effect, minutes.
    let equation_of_time = MINUTES_PER_DEGREE * (epsilon - beta + (lambda - nu)) * R2D;

    let declination = f64::asin(
        tilt_sin
            * f64::sin(
                f64::sin(MEAN_DAILY_MOTION * (d - 2.0) * D2R) * 0.016713
                    + MEAN_DAILY_MOTION * (d - 2.0) * D2R
                    - MARCH_EQUINOX_NU * D2R,
            ),
    );

    // True solar time in minutes, then the hour angle.
    let tst = (hour_utc + at.lon / (15.0 * D2R)) * 60.0 + equation_of_time;
    let hour_angle = (tst / 4.0 - 180.0) * D2R;

    // Sunrise/sunset hour angle, clamped for polar day and polar night.
    let sha_cos = f64::cos(90.833 * D2R) / (f64::cos(at.lat) * f64::cos(declination))
        - f64::tan(at.lat) * f64::tan(declination);
    let sha = f64::acos(sha_cos.clamp(-1.0, 1.0));

    let mut cos_zenith = f64::sin(at.lat) * f64::sin(declination)
        + f64::cos(at.lat) * f64::cos(declination) * f64::cos(hour_angle);
    cos_zenith = cos_zenith.clamp(-1.0, 1.0);
    let zenith_angle = f64::acos(cos_zenith);

    // Event times relative to UTC; longitude sign flips for time reckoning.
    let sunrise_utc =
        ((720.0 + (-at.lon - sha) * R2D * 4.0 - equation_of_time) / 60.0 + 24.0) % 24.0;
    let sunset_utc =
        ((720.0 + (-at.lon + sha) * R2D * 4.0 - equation_of_time) / 60.0 + 24.0) % 24.0;
    let noon_utc = ((720.0 + -at.lon * R2D * 4.0 - equation_of_time) / 60.0 + 24.0) % 24.0;

    SolarPosition {
        declination,
        hour_angle,
        zenith_angle,
        equation_of_time,
        sunrise_utc,
        sunset_utc,
        noon_utc,
    }
}

impl SolarPosition {
    /// The sun is above the horizon at this position.
    pub fn is_day(&self) -> bool {
        self.zenith_angle < PI / 2.0
    }

    /// Hours elapsed since local sunset for a UTC hour, 0 during daylight.
    /// Handles sunset/sunrise times that straddle the UTC day boundary.
    pub fn hours_after_sunset(&self, hour_utc: f64) -> f64 {
        let lss = self.sunset_utc;
        let lsr = self.sunrise_utc;
        if lss >= lsr && hour_utc >= lss && hour_utc >= lsr {
            hour_utc - lss
        } else if lss < lsr && hour_utc >= lss && hour_utc < lsr {
            hour_utc - lss
        } else if lss >= lsr && hour_utc < lss && hour_utc < lsr {
            24.0 - lss + hour_utc
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greenwich(lat_deg: f64) -> GeographicPoint {
        GeographicPoint::from_degrees(lat_deg, 0.0).unwrap()
    }

    #[test]
    fn declination_tracks_the_seasons() {
        let june = solar_position(greenwich(40.0), 6, 12.0);
        let december = solar_position(greenwich(40.0), 12, 12.0);
        let march = solar_position(greenwich(40.0), 3, 12.0);
        assert!(june.declination > 20.0 * D2R);
        assert!(december.declination < -20.0 * D2R);
        assert!(march.declination.abs() < 5.0 * D2R);
    }

    #[test]
    fn noon_zenith_matches_latitude_minus_declination() {
        let sp = solar_position(greenwich(40.0), 3, 12.0);
        let expected = (40.0 * D2R - sp.declination).abs();
        assert!(
            (sp.zenith_angle - expected).abs() < 2.0 * D2R,
            "noon zenith {} vs expected {}",
            sp.zenith_angle * R2D,
            expected * R2D
        );
    }

    #[test]
    fn noon_near_twelve_utc_on_the_meridian() {
        let sp = solar_position(greenwich(40.0), 6, 12.0);
        assert!((sp.noon_utc - 12.0).abs() < 0.5);
        assert!(sp.sunrise_utc < sp.noon_utc && sp.noon_utc < sp.sunset_utc);
    }

    #[test]
    fn midnight_is_dark_noon_is_lit() {
        assert!(!solar_position(greenwich(40.0), 6, 0.0).is_day());
        assert!(solar_position(greenwich(40.0), 6, 12.0).is_day());
    }

    #[test]
    fn polar_night_does_not_produce_nan() {
        let sp = solar_position(greenwich(80.0), 12, 12.0);
        assert!(sp.sunrise_utc.is_finite() && sp.sunset_utc.is_finite());
        assert!(!sp.is_day());
    }

    #[test]
    fn hours_after_sunset_zero_in_daylight() {
        let sp = solar_position(greenwich(40.0), 6, 12.0);
        assert_eq!(sp.hours_after_sunset(12.0), 0.0);
        let after = sp.hours_after_sunset((sp.sunset_utc + 3.0) % 24.0);
        assert!(after > 0.0 && after <= 4.0, "got {after}");
    }
}
