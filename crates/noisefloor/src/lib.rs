//! Ambient radio-noise model for HF circuit planning.
//!
//! Produces a decile [`Distribution`] of the expected external noise figure at
//! a receiver site from three independent sources: atmospheric climatology,
//! galactic background above the ionospheric transparency knee, and a man-made
//! floor keyed by the siting category. Levels are expressed in dB above kT0b
//! at the given frequency, 1 Hz reference bandwidth.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

/// Frequency above which the ionosphere is treated as transparent to the
/// galactic background. Below the knee the source contributes nothing.
pub const GALACTIC_KNEE_MHZ: f64 = 10.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NoiseError {
    #[error("frequency must be positive and finite, got {0} MHz")]
    InvalidFrequency(f64),
    #[error("hour must be in 0..24, got {0}")]
    InvalidHour(u32),
    #[error("month must be in 1..=12, got {0}")]
    InvalidMonth(u32),
    #[error("latitude must be within +/-pi/2 rad, got {0}")]
    InvalidLatitude(f64),
    #[error("decile ordering violated: lower {lower} <= median {median} <= upper {upper} does not hold")]
    DecileOrdering { lower: f64, median: f64, upper: f64 },
}

/// A two-sided decile description of a log-power quantity in dB.
///
/// `lower_decile <= median <= upper_decile` holds for every constructed
/// value; the checked constructor rejects violations and the spread-based
/// constructor cannot produce them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    median: f64,
    upper_decile: f64,
    lower_decile: f64,
}

impl Distribution {
    /// Build from absolute decile values, enforcing the ordering invariant.
    pub fn new(median: f64, upper_decile: f64, lower_decile: f64) -> Result<Self, NoiseError> {
        if lower_decile > median || median > upper_decile {
            return Err(NoiseError::DecileOrdering {
                lower: lower_decile,
                median,
                upper: upper_decile,
            });
        }
        Ok(Self {
            median,
            upper_decile,
            lower_decile,
        })
    }

    /// Build from a median and non-negative decile deviations.
    pub fn from_deciles(median: f64, upper_dev: f64, lower_dev: f64) -> Self {
        debug_assert!(upper_dev >= 0.0 && lower_dev >= 0.0);
        Self {
            median,
            upper_decile: median + upper_dev,
            lower_decile: median - lower_dev,
        }
    }

    pub fn median(&self) -> f64 {
        self.median
    }

    pub fn upper_decile(&self) -> f64 {
        self.upper_decile
    }

    pub fn lower_decile(&self) -> f64 {
        self.lower_decile
    }

    /// Deviation of the upper decile above the median, always >= 0.
    pub fn upper_spread(&self) -> f64 {
        self.upper_decile - self.median
    }

    /// Deviation of the lower decile below the median, always >= 0.
    pub fn lower_spread(&self) -> f64 {
        self.median - self.lower_decile
    }

    /// Shift the whole distribution by a fixed offset in dB.
    pub fn offset(&self, db: f64) -> Self {
        Self {
            median: self.median + db,
            upper_decile: self.upper_decile + db,
            lower_decile: self.lower_decile + db,
        }
    }
}

/// The closed set of ambient-noise sources the model combines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoiseSource {
    Atmospheric,
    Galactic,
    ManMade,
}

/// Receiver siting category for the man-made noise floor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvironmentCategory {
    City,
    #[default]
    Residential,
    Rural,
    QuietRural,
    Quiet,
    Noisy,
}

// Man-made reference levels: (c, d, upper decile, lower decile) with
// Fam = c - d * log10(f MHz).
const CITY: (f64, f64, f64, f64) = (76.8, 27.7, 11.0, 6.7);
const RESIDENTIAL: (f64, f64, f64, f64) = (72.5, 27.7, 10.6, 5.3);
const RURAL: (f64, f64, f64, f64) = (67.2, 27.7, 9.2, 4.6);
const QUIET_RURAL: (f64, f64, f64, f64) = (53.6, 28.6, 9.2, 4.6);
const QUIET: (f64, f64, f64, f64) = (65.2, 29.1, 9.2, 4.6);
const NOISY: (f64, f64, f64, f64) = (83.2, 37.5, 11.0, 6.7);

/// Season bucket used by the atmospheric climatology. Hemisphere-aware.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Season {
    Winter,
    #[default]
    Equinox,
    Summer,
}

impl Season {
    /// Map a month and site latitude to the climatology season.
    pub fn from_month_lat(month: u32, lat_rad: f64) -> Result<Self, NoiseError> {
        if !(1..=12).contains(&month) {
            return Err(NoiseError::InvalidMonth(month));
        }
        let northern = match month {
            11 | 12 | 1 | 2 => Season::Winter,
            3 | 4 | 9 | 10 => Season::Equinox,
            _ => Season::Summer,
        };
        Ok(if lat_rad >= 0.0 {
            northern
        } else {
            match northern {
                Season::Winter => Season::Summer,
                Season::Summer => Season::Winter,
                Season::Equinox => Season::Equinox,
            }
        })
    }

    fn index(self) -> usize {
        match self {
            Season::Winter => 0,
            Season::Equinox => 1,
            Season::Summer => 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct AtmosphericBlock {
    fam_1mhz: f64, // 1 MHz reference level, dB above kT0b
    du: f64,       // upper decile deviation at 1 MHz
    dl: f64,       // lower decile deviation at 1 MHz
}

#[derive(Debug, Clone)]
struct SeasonClimate {
    blocks: [AtmosphericBlock; 6], // one per 4-hour local-time block
}

// Condensed mid-latitude 1 MHz reference curve per season and 4-hour local
// timeblock, 0000-0400 first. High at night, minimum near local noon,
// strongest in the thunderstorm season.
const FAM_1MHZ: [[f64; 6]; 3] = [
    [82.0, 74.0, 52.0, 48.0, 65.0, 79.0],
    [86.0, 78.0, 57.0, 54.0, 70.0, 83.0],
    [92.0, 84.0, 63.0, 60.0, 78.0, 89.0],
];

const ATMOS_DU_1MHZ: [[f64; 6]; 3] = [
    [9.5, 9.0, 7.0, 6.5, 8.5, 9.5],
    [10.0, 9.5, 7.5, 7.0, 9.0, 10.0],
    [11.0, 10.5, 8.5, 8.0, 10.0, 11.0],
];

const ATMOS_DL_1MHZ: [[f64; 6]; 3] = [
    [7.0, 6.5, 5.5, 5.0, 6.0, 7.0],
    [7.5, 7.0, 6.0, 5.5, 6.5, 7.5],
    [8.0, 7.5, 6.5, 6.0, 7.0, 8.0],
];

// Frequency variation of the 1 MHz reference level, quadratic in log10(f).
const ATMOS_FREQ_SLOPE: f64 = -26.0;
const ATMOS_FREQ_CURVE: f64 = -8.0;

// Decile deviations widen slowly with frequency.
const ATMOS_DU_FREQ_SLOPE: f64 = 1.2;
const ATMOS_DL_FREQ_SLOPE: f64 = 0.8;

lazy_static! {
    static ref ATMOS_CLIMATE: Vec<SeasonClimate> =
        (0..3).map(build_season_climate).collect::<Vec<_>>();
}

fn build_season_climate(season: usize) -> SeasonClimate {
    let mut blocks = [AtmosphericBlock {
        fam_1mhz: 0.0,
        du: 0.0,
        dl: 0.0,
    }; 6];
    for (tb, block) in blocks.iter_mut().enumerate() {
        *block = AtmosphericBlock {
            fam_1mhz: FAM_1MHZ[season][tb],
            du: ATMOS_DU_1MHZ[season][tb],
            dl: ATMOS_DL_1MHZ[season][tb],
        };
    }
    SeasonClimate { blocks }
}

/// Ambient-noise estimate at one frequency, hour and site: the per-source
/// components together with their combination.
#[derive(Debug, Clone, Serialize)]
pub struct AmbientNoise {
    atmospheric: Distribution,
    galactic: Option<Distribution>,
    man_made: Distribution,
    combined: Distribution,
}

impl AmbientNoise {
    /// Combined noise figure distribution, dB above kT0b in 1 Hz.
    pub fn combined(&self) -> Distribution {
        self.combined
    }

    /// Atmospheric component.
    pub fn atmospheric(&self) -> Distribution {
        self.atmospheric
    }

    /// Galactic component; `None` below the transparency knee.
    pub fn galactic(&self) -> Option<Distribution> {
        self.galactic
    }

    /// Man-made component.
    pub fn man_made(&self) -> Distribution {
        self.man_made
    }

    /// The contributing sources in combination order.
    pub fn sources(&self) -> Vec<(NoiseSource, Distribution)> {
        let mut v = vec![(NoiseSource::Atmospheric, self.atmospheric)];
        if let Some(g) = self.galactic {
            v.push((NoiseSource::Galactic, g));
        }
        v.push((NoiseSource::ManMade, self.man_made));
        v
    }
}

/// Estimate the ambient noise at a receiver site.
///
/// `hour_utc` is the UTC hour (0..24); local mean time, which drives the
/// atmospheric climatology, is derived from the site longitude. Latitude and
/// longitude are in radians.
pub fn ambient_noise(
    hour_utc: u32,
    lat_rad: f64,
    lon_rad: f64,
    category: EnvironmentCategory,
    frequency_mhz: f64,
    month: u32,
) -> Result<AmbientNoise, NoiseError> {
    if hour_utc >= 24 {
        return Err(NoiseError::InvalidHour(hour_utc));
    }
    if !frequency_mhz.is_finite() || frequency_mhz <= 0.0 {
        return Err(NoiseError::InvalidFrequency(frequency_mhz));
    }
    if lat_rad.abs() > PI / 2.0 {
        return Err(NoiseError::InvalidLatitude(lat_rad));
    }
    let season = Season::from_month_lat(month, lat_rad)?;

    let atmospheric = atmospheric_noise(hour_utc, lon_rad, season, frequency_mhz);
    let man_made = man_made_noise(category, frequency_mhz);
    let galactic = galactic_noise(frequency_mhz);

    let mut sources = vec![(NoiseSource::Atmospheric, atmospheric)];
    if let Some(g) = galactic {
        sources.push((NoiseSource::Galactic, g));
    }
    sources.push((NoiseSource::ManMade, man_made));

    let combined = combine_sources(&sources);

    Ok(AmbientNoise {
        atmospheric,
        galactic,
        man_made,
        combined,
    })
}

/// Combine independent noise sources into one distribution.
///
/// Medians add in linear power. Decile deviations, taken from each source's
/// own median, combine in quadrature on the matching side.
pub fn combine_sources(sources: &[(NoiseSource, Distribution)]) -> Distribution {
    let linear_sum: f64 = sources
        .iter()
        .map(|(_, d)| 10.0_f64.powf(d.median() / 10.0))
        .sum();
    let median = 10.0 * linear_sum.log10();

    let upper_dev = sources
        .iter()
        .map(|(_, d)| d.upper_spread().powi(2))
        .sum::<f64>()
        .sqrt();
    let lower_dev = sources
        .iter()
        .map(|(_, d)| d.lower_spread().powi(2))
        .sum::<f64>()
        .sqrt();

    Distribution::from_deciles(median, upper_dev, lower_dev)
}

/// Atmospheric noise from the condensed climatology.
///
/// The level is read for the 4-hour local timeblock containing the receiver
/// local mean time and the adjacent block, then interpolated between the two
/// in linear power.
fn atmospheric_noise(hour_utc: u32, lon_rad: f64, season: Season, frequency_mhz: f64) -> Distribution {
    // Local mean time shifts one hour per 15 degrees of longitude.
    let mut lmt = hour_utc as i32 + (lon_rad / (15.0 * PI / 180.0)) as i32;
    if lmt < 0 {
        lmt += 24;
    } else if lmt > 23 {
        lmt -= 24;
    }

    let climate = &ATMOS_CLIMATE[season.index()];
    let now = climate.blocks[(lmt as usize / 4) % 6];
    let adj = climate.blocks[(lmt as usize / 4 + 1) % 6];
    let slp = (lmt % 4) as f64 / 4.0;

    let blend = |a: f64, b: f64| -> f64 {
        10.0 * (10.0_f64.powf(a / 10.0) + (10.0_f64.powf(b / 10.0) - 10.0_f64.powf(a / 10.0)) * slp)
            .log10()
    };

    let x = frequency_mhz.log10();
    let fa = blend(now.fam_1mhz, adj.fam_1mhz) + ATMOS_FREQ_SLOPE * x + ATMOS_FREQ_CURVE * x * x;
    let du = blend(now.du, adj.du) + ATMOS_DU_FREQ_SLOPE * x.max(0.0);
    let dl = blend(now.dl, adj.dl) + ATMOS_DL_FREQ_SLOPE * x.max(0.0);

    Distribution::from_deciles(fa, du.max(0.0), dl.max(0.0))
}

fn man_made_noise(category: EnvironmentCategory, frequency_mhz: f64) -> Distribution {
    let (c, d, du, dl) = match category {
        EnvironmentCategory::City => CITY,
        EnvironmentCategory::Residential => RESIDENTIAL,
        EnvironmentCategory::Rural => RURAL,
        EnvironmentCategory::QuietRural => QUIET_RURAL,
        EnvironmentCategory::Quiet => QUIET,
        EnvironmentCategory::Noisy => NOISY,
    };
    Distribution::from_deciles(c - d * frequency_mhz.log10(), du, dl)
}

fn galactic_noise(frequency_mhz: f64) -> Option<Distribution> {
    if frequency_mhz < GALACTIC_KNEE_MHZ {
        return None;
    }
    Some(Distribution::from_deciles(
        52.0 - 23.0 * frequency_mhz.log10(),
        2.0,
        2.0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE_LAT: f64 = 40.0 * PI / 180.0;
    const SITE_LON: f64 = -105.0 * PI / 180.0;

    #[test]
    fn checked_constructor_rejects_bad_ordering() {
        assert!(Distribution::new(10.0, 5.0, 0.0).is_err());
        assert!(Distribution::new(10.0, 15.0, 12.0).is_err());
        let d = Distribution::new(10.0, 15.0, 4.0).unwrap();
        assert_eq!(d.upper_spread(), 5.0);
        assert_eq!(d.lower_spread(), 6.0);
    }

    #[test]
    fn combined_median_exceeds_every_component() {
        let n = ambient_noise(
            14,
            SITE_LAT,
            SITE_LON,
            EnvironmentCategory::Rural,
            7.5,
            6,
        )
        .unwrap();
        let combined = n.combined().median();
        for (_, d) in n.sources() {
            assert!(
                combined >= d.median(),
                "combined {combined} dB fell below a component at {} dB",
                d.median()
            );
        }
    }

    #[test]
    fn decile_ordering_holds_across_band() {
        for f in [3.0, 5.0, 7.0, 10.0, 14.0, 18.0, 21.0, 24.0, 28.0] {
            for hour in 0..24 {
                let n = ambient_noise(
                    hour,
                    SITE_LAT,
                    SITE_LON,
                    EnvironmentCategory::Residential,
                    f,
                    1,
                )
                .unwrap();
                let d = n.combined();
                assert!(d.lower_decile() <= d.median() && d.median() <= d.upper_decile());
            }
        }
    }

    #[test]
    fn galactic_appears_above_knee_only() {
        let below = ambient_noise(6, SITE_LAT, SITE_LON, EnvironmentCategory::Quiet, 7.0, 3)
            .unwrap();
        assert!(below.galactic().is_none());
        assert_eq!(below.sources().len(), 2);

        let above = ambient_noise(6, SITE_LAT, SITE_LON, EnvironmentCategory::Quiet, 15.0, 3)
            .unwrap();
        let g = above.galactic().expect("transparent above the knee");
        assert!((g.median() - (52.0 - 23.0 * 15.0_f64.log10())).abs() < 1e-9);
        assert_eq!(above.sources().len(), 3);
    }

    #[test]
    fn city_louder_than_quiet_rural() {
        let city = ambient_noise(12, SITE_LAT, SITE_LON, EnvironmentCategory::City, 10.0, 6)
            .unwrap();
        let rural = ambient_noise(
            12,
            SITE_LAT,
            SITE_LON,
            EnvironmentCategory::QuietRural,
            10.0,
            6,
        )
        .unwrap();
        assert!(city.man_made().median() > rural.man_made().median() + 15.0);
    }

    #[test]
    fn atmospheric_falls_with_frequency() {
        let lo = ambient_noise(2, SITE_LAT, SITE_LON, EnvironmentCategory::Rural, 3.0, 7)
            .unwrap();
        let hi = ambient_noise(2, SITE_LAT, SITE_LON, EnvironmentCategory::Rural, 24.0, 7)
            .unwrap();
        assert!(lo.atmospheric().median() > hi.atmospheric().median() + 20.0);
    }

    #[test]
    fn night_noisier_than_noon_at_low_frequency() {
        // 0500 UTC is 2200 local at 105W; 1900 UTC is noon.
        let night = ambient_noise(5, SITE_LAT, SITE_LON, EnvironmentCategory::Rural, 5.0, 6)
            .unwrap();
        let noon = ambient_noise(19, SITE_LAT, SITE_LON, EnvironmentCategory::Rural, 5.0, 6)
            .unwrap();
        assert!(night.atmospheric().median() > noon.atmospheric().median());
    }

    #[test]
    fn southern_hemisphere_swaps_seasons() {
        assert_eq!(
            Season::from_month_lat(1, SITE_LAT).unwrap(),
            Season::Winter
        );
        assert_eq!(
            Season::from_month_lat(1, -SITE_LAT).unwrap(),
            Season::Summer
        );
        assert_eq!(
            Season::from_month_lat(4, -SITE_LAT).unwrap(),
            Season::Equinox
        );
    }

    #[test]
    fn rss_combination_of_deciles() {
        let a = Distribution::from_deciles(0.0, 3.0, 3.0);
        let b = Distribution::from_deciles(0.0, 4.0, 4.0);
        let c = combine_sources(&[(NoiseSource::Atmospheric, a), (NoiseSource::ManMade, b)]);
        assert!((c.upper_spread() - 5.0).abs() < 1e-12);
        assert!((c.lower_spread() - 5.0).abs() < 1e-12);
        // Two equal medians add 3 dB.
        assert!((c.median() - 10.0 * 2.0_f64.log10()).abs() < 1e-12);
    }

    #[test]
    fn input_validation() {
        assert!(matches!(
            ambient_noise(24, SITE_LAT, SITE_LON, EnvironmentCategory::Rural, 7.0, 6),
            Err(NoiseError::InvalidHour(24))
        ));
        assert!(matches!(
            ambient_noise(0, SITE_LAT, SITE_LON, EnvironmentCategory::Rural, -1.0, 6),
            Err(NoiseError::InvalidFrequency(_))
        ));
        assert!(matches!(
            ambient_noise(0, SITE_LAT, SITE_LON, EnvironmentCategory::Rural, 7.0, 13),
            Err(NoiseError::InvalidMonth(13))
        ));
    }
}
