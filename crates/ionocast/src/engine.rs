//! The per-(hour, frequency) evaluation: modes in, reliability out.
//!
//! For one hour the engine freezes the layer profile and the loss context
//! into an [`HourContext`], then for each frequency walks the valid modes,
//! turns each loss total into a day-to-day signal distribution, folds in the
//! ambient noise with the asymmetric decile pairing and keeps the mode with
//! the best odds of clearing the required SNR. No state survives between
//! evaluations.

use serde::Serialize;
use tracing::debug;

use noisefloor::{ambient_noise, Distribution};

use crate::antenna::AntennaGain;
use crate::config::{validate_frequency, CircuitConfig};
use crate::constants::*;
use crate::error::ConfigError;
use crate::ionosphere::{IonosphereModel, LayerProfile};
use crate::loss::{LossBreakdown, LossContext};
use crate::muf::{dominant_mode, MufResult};
use crate::path::{bearing, PathGeometry};
use crate::reflectrix::{find_modes, Mode, ModeId};
use crate::stats::{exceedance_probability, rss};

/// Signal power stand-in when no mode connects the circuit, dBW. Far below
/// any ambient noise floor.
const NO_MODE_SIGNAL_DBW: f64 = -307.0;

// Day-to-day signal decile deviations (dB) by frequency-to-basic-MUF ratio
// bin, for paths staying under and reaching 60 degrees geomagnetic. The
// spread peaks just above the MUF where ionospheric support comes and goes.
const SIGNAL_DL_DB: [[f64; 10]; 2] = [
    [8.0, 12.0, 13.0, 10.0, 8.0, 8.0, 8.0, 7.0, 6.0, 5.0],
    [11.0, 16.0, 17.0, 13.0, 11.0, 11.0, 11.0, 9.0, 8.0, 7.0],
];
const SIGNAL_DU_DB: [[f64; 10]; 2] = [
    [6.0, 8.0, 12.0, 13.0, 12.0, 9.0, 9.0, 8.0, 7.0, 7.0],
    [9.0, 11.0, 12.0, 13.0, 12.0, 9.0, 9.0, 8.0, 7.0, 7.0],
];

fn muf_ratio_bin(ratio: f64) -> usize {
    if ratio <= 0.8 {
        0
    } else if ratio <= 1.0 {
        1
    } else if ratio <= 1.2 {
        2
    } else if ratio <= 1.4 {
        3
    } else if ratio <= 1.6 {
        4
    } else if ratio <= 1.8 {
        5
    } else if ratio <= 2.0 {
        6
    } else if ratio <= 3.0 {
        7
    } else if ratio <= 4.0 {
        8
    } else {
        9
    }
}

/// Day-to-day (upper, lower) decile deviations of one mode's signal.
fn signal_deciles(high_latitude: bool, frequency_mhz: f64, basic_muf_mhz: f64) -> (f64, f64) {
    let row = usize::from(high_latitude);
    let bin = muf_ratio_bin(frequency_mhz / basic_muf_mhz);
    (SIGNAL_DU_DB[row][bin], SIGNAL_DL_DB[row][bin])
}

/// Everything about one hour that is shared across its frequency sweep.
#[derive(Debug, Clone)]
pub struct HourContext {
    pub hour_utc: u32,
    pub profile: LayerProfile,
    pub loss: LossContext,
}

/// The outcome of one (hour, frequency) evaluation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub hour_utc: u32,
    pub frequency_mhz: f64,
    /// SNR in the receiver bandwidth, dB.
    pub snr: Distribution,
    /// Noise power in the receiver bandwidth, dBW.
    pub noise: Distribution,
    pub required_snr_db: f64,
    /// Probability of meeting `required_snr_db` on a given day.
    pub reliability: f64,
    /// Probability that the day's MUF exceeds the operating frequency.
    pub muf_day_probability: f64,
    /// Median circuit MUF; zero when no mode solved.
    pub circuit_muf_mhz: f64,
    /// Circuit MUF uplifted by the operational ratio; zero when no mode
    /// solved.
    pub operational_muf_mhz: f64,
    pub fot_mhz: f64,
    pub best_mode: Option<ModeId>,
    pub best_loss: Option<LossBreakdown>,
    /// Median received signal power of the best mode, dBW.
    pub signal_power_dbw: Option<f64>,
    pub mode_count: usize,
}

/// Orchestrates Reflectrix, the MUF statistics and the noise model for one
/// circuit configuration.
pub struct PredictionEngine<'a> {
    config: &'a CircuitConfig,
    path: PathGeometry,
    ionosphere: &'a dyn IonosphereModel,
    tx_antenna: &'a dyn AntennaGain,
    rx_antenna: &'a dyn AntennaGain,
    tx_azimuth: f64,
    rx_azimuth: f64,
    high_latitude: bool,
}

impl<'a> PredictionEngine<'a> {
    pub fn new(
        config: &'a CircuitConfig,
        ionosphere: &'a dyn IonosphereModel,
        tx_antenna: &'a dyn AntennaGain,
        rx_antenna: &'a dyn AntennaGain,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let path = config.path()?;
        let tx_azimuth = path.bearing();
        let rx_azimuth = bearing(path.receiver(), path.transmitter());
        let high_latitude = path.max_geomagnetic_lat() >= 60.0 * D2R;
        Ok(Self {
            config,
            path,
            ionosphere,
            tx_antenna,
            rx_antenna,
            tx_azimuth,
            rx_azimuth,
            high_latitude,
        })
    }

    pub fn path(&self) -> &PathGeometry {
        &self.path
    }

    pub fn config(&self) -> &CircuitConfig {
        self.config
    }

    /// Freeze the layer profile and loss context for one hour.
    pub fn hour_context(&self, hour_utc: u32) -> Result<HourContext, ConfigError> {
        if hour_utc >= 24 {
            return Err(ConfigError::InvalidHour(hour_utc));
        }
        let profile = self.ionosphere.layers(
            self.path.midpoint(),
            self.config.month,
            hour_utc,
            self.config.indices,
        );
        profile.validate()?;
        let loss = LossContext::new(
            &self.path,
            &profile,
            self.config.month,
            hour_utc,
            self.config.indices.sunspot_number,
        )?;
        Ok(HourContext {
            hour_utc,
            profile,
            loss,
        })
    }

    /// Ambient noise power in the receiver bandwidth, dBW.
    fn noise_power(&self, hour_utc: u32, frequency_mhz: f64) -> Result<Distribution, ConfigError> {
        let rx = self.path.receiver();
        let figure = ambient_noise(
            hour_utc,
            rx.lat,
            rx.lon,
            self.config.rx_environment,
            frequency_mhz,
            self.config.month,
        )?
        .combined();
        Ok(figure.offset(KT0_DBW + 10.0 * self.config.link.bandwidth_hz.log10()))
    }

    /// Evaluate one frequency within a prepared hour.
    pub fn evaluate(
        &self,
        ctx: &HourContext,
        frequency_mhz: f64,
    ) -> Result<PredictionResult, ConfigError> {
        validate_frequency(frequency_mhz)?;
        let noise = self.noise_power(ctx.hour_utc, frequency_mhz)?;
        let modes = find_modes(&self.path, &ctx.profile, frequency_mhz, &ctx.loss);

        let Some(dominant) = dominant_mode(&modes) else {
            debug!(
                hour = ctx.hour_utc,
                frequency_mhz, "no mode connects the circuit"
            );
            return Ok(self.no_mode_result(ctx.hour_utc, frequency_mhz, noise));
        };

        // The operational-MUF power band keys on the EIRP toward the
        // dominant mode's takeoff elevation.
        let eirp_dbw = self.config.link.power_dbw()
            + self
                .tx_antenna
                .gain_db(dominant.elevation, self.tx_azimuth, frequency_mhz);
        let muf = MufResult::from_dominant(dominant, &ctx.loss, eirp_dbw);
        let muf_day_probability = muf.muf_day_probability(frequency_mhz);

        let mut best: Option<(f64, Distribution, f64, &Mode)> = None;
        for mode in &modes {
            let (snr, signal_dbw) = self.mode_snr(mode, frequency_mhz, &noise);
            let reliability = snr_reliability(&snr, self.config.link.required_snr_db);
            let better = match &best {
                None => true,
                Some((r, s, _, _)) => {
                    reliability > *r || (reliability == *r && snr.median() > s.median())
                }
            };
            if better {
                best = Some((reliability, snr, signal_dbw, mode));
            }
        }
        // `modes` is non-empty here.
        let Some((reliability, snr, signal_dbw, mode)) = best else {
            return Ok(self.no_mode_result(ctx.hour_utc, frequency_mhz, noise));
        };

        Ok(PredictionResult {
            hour_utc: ctx.hour_utc,
            frequency_mhz,
            snr,
            noise,
            required_snr_db: self.config.link.required_snr_db,
            reliability,
            muf_day_probability,
            circuit_muf_mhz: muf.circuit_muf_mhz,
            operational_muf_mhz: muf.operational_muf_mhz,
            fot_mhz: muf.fot_mhz,
            best_mode: Some(mode.id),
            best_loss: Some(mode.loss),
            signal_power_dbw: Some(signal_dbw),
            mode_count: modes.len(),
        })
    }

    /// Build the hour context and evaluate in one call.
    pub fn evaluate_at(
        &self,
        hour_utc: u32,
        frequency_mhz: f64,
    ) -> Result<PredictionResult, ConfigError> {
        let ctx = self.hour_context(hour_utc)?;
        self.evaluate(&ctx, frequency_mhz)
    }

    /// Signal and SNR distributions for one mode.
    fn mode_snr(&self, mode: &Mode, frequency_mhz: f64, noise: &Distribution) -> (Distribution, f64) {
        let link = &self.config.link;
        let tx_gain = self
            .tx_antenna
            .gain_db(mode.elevation, self.tx_azimuth, frequency_mhz);
        let rx_gain = self
            .rx_antenna
            .gain_db(mode.elevation, self.rx_azimuth, frequency_mhz);
        let signal_dbw = link.power_dbw() + tx_gain + rx_gain - mode.loss.total_db;

        let (du, dl) = signal_deciles(self.high_latitude, frequency_mhz, mode.basic_muf_mhz);
        let signal = Distribution::from_deciles(signal_dbw, du, dl);

        // Asymmetric pairing: a bad day pairs a weak signal with loud noise,
        // a good day a strong signal with quiet noise.
        let snr_median = signal.median() - noise.median();
        let low_spread = rss(noise.upper_spread(), signal.lower_spread());
        let high_spread = rss(noise.lower_spread(), signal.upper_spread());
        (
            Distribution::from_deciles(snr_median, high_spread, low_spread),
            signal_dbw,
        )
    }

    fn no_mode_result(
        &self,
        hour_utc: u32,
        frequency_mhz: f64,
        noise: Distribution,
    ) -> PredictionResult {
        let snr = Distribution::from_deciles(NO_MODE_SIGNAL_DBW - noise.median(), 0.0, 0.0);
        PredictionResult {
            hour_utc,
            frequency_mhz,
            snr,
            noise,
            required_snr_db: self.config.link.required_snr_db,
            reliability: 0.0,
            muf_day_probability: 0.0,
            circuit_muf_mhz: 0.0,
            operational_muf_mhz: 0.0,
            fot_mhz: 0.0,
            best_mode: None,
            best_loss: None,
            signal_power_dbw: None,
            mode_count: 0,
        }
    }
}

/// Probability that the day's SNR clears the threshold.
///
/// The deficit is standardized against the decile spread on the side of the
/// median the threshold falls, scaled by [`Z_DECILE_SCALE`] — the partner of
/// [`Z_DECILE_SIGMA`] in the joint decile-constant pair.
pub fn snr_reliability(snr: &Distribution, required_snr_db: f64) -> f64 {
    let spread = if snr.median() < required_snr_db {
        snr.lower_spread()
    } else {
        snr.upper_spread()
    };
    if spread <= 0.0 {
        return if snr.median() >= required_snr_db {
            1.0
        } else {
            0.0
        };
    }
    let z = (required_snr_db - snr.median()) / (spread / Z_DECILE_SCALE);
    exceedance_probability(z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::antenna::{Isotropic, PatternPlane, PatternTable};
    use crate::config::{EnvironmentCategory, LinkParameters, ServiceKind};
    use crate::ionosphere::{
        FixedIonosphere, LayerProfile, LayerState, ParametricIonosphere, SolarIndices,
    };
    use crate::path::GeographicPoint;

    fn midlat_config() -> CircuitConfig {
        CircuitConfig {
            transmitter: GeographicPoint::from_degrees(40.0, -105.3).unwrap(),
            receiver: GeographicPoint::from_degrees(38.6, -90.2).unwrap(),
            month: 6,
            indices: SolarIndices::from_ssn(100.0).unwrap(),
            link: LinkParameters::for_service(ServiceKind::VoiceSsb, 500.0).unwrap(),
            rx_environment: EnvironmentCategory::Rural,
        }
    }

    fn dist(median: f64, du: f64, dl: f64) -> Distribution {
        Distribution::from_deciles(median, du, dl)
    }

    #[test]
    fn reliability_bounds_and_monotonicity() {
        let snr = dist(20.0, 6.0, 9.0);
        let mut prev = 1.0;
        for required in (-10..60).map(f64::from) {
            let r = snr_reliability(&snr, required);
            assert!((0.0..=1.0).contains(&r));
            assert!(r <= prev, "reliability rose as the threshold tightened");
            prev = r;
        }
    }

    #[test]
    fn reliability_at_the_deciles() {
        let snr = dist(20.0, 6.0, 9.0);
        // Threshold at the lower decile: met nine days in ten.
        assert!((snr_reliability(&snr, 11.0) - 0.9).abs() < 1e-6);
        // Threshold at the median: even odds.
        assert!((snr_reliability(&snr, 20.0) - 0.5).abs() < 1e-6);
        // Threshold at the upper decile: met one day in ten.
        assert!((snr_reliability(&snr, 26.0) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn decile_table_tracks_the_muf_crossing() {
        // The spread is widest just above the MUF in both latitude rows.
        let (_, dl_below) = signal_deciles(false, 10.0, 14.0);
        let (_, dl_at) = signal_deciles(false, 15.0, 14.0);
        let (_, dl_far) = signal_deciles(false, 28.0, 5.5);
        assert!(dl_at > dl_below);
        assert!(dl_far < dl_at);

        let (_, dl_high) = signal_deciles(true, 15.0, 14.0);
        assert!(dl_high > dl_at);
    }

    #[test]
    fn asymmetric_snr_pairing() {
        let config = midlat_config();
        let iono = ParametricIonosphere;
        let engine = PredictionEngine::new(&config, &iono, &Isotropic, &Isotropic).unwrap();
        let result = engine.evaluate_at(18, 14.0).unwrap();
        assert!(result.mode_count > 0);

        // Each SNR spread folds in the opposite noise decile, so both must
        // exceed the noise spread they pair with.
        assert!(result.snr.lower_spread() > result.noise.upper_spread());
        assert!(result.snr.upper_spread() > result.noise.lower_spread());
        assert!(
            (result.snr.lower_spread() - result.snr.upper_spread()).abs() > 1e-9,
            "pairing should skew the SNR distribution"
        );
        assert!(result.snr.lower_decile() <= result.snr.median());
        assert!(result.snr.median() <= result.snr.upper_decile());
    }

    #[test]
    fn evaluation_is_idempotent() {
        let config = midlat_config();
        let iono = ParametricIonosphere;
        let engine = PredictionEngine::new(&config, &iono, &Isotropic, &Isotropic).unwrap();
        let ctx = engine.hour_context(15).unwrap();
        let a = engine.evaluate(&ctx, 18.1).unwrap();
        let b = engine.evaluate(&ctx, 18.1).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.snr.median().to_bits(),
            b.snr.median().to_bits(),
            "repeat evaluations must be bit-identical"
        );
    }

    #[test]
    fn subcritical_layers_kill_reliability() {
        // Critical frequencies far below the band: every mode survives only
        // through the excess-loss policy and none is usable.
        let config = midlat_config();
        let iono = FixedIonosphere {
            profile: LayerProfile {
                e: LayerState {
                    critical_frequency_mhz: 0.4,
                    reflection_height_km: 110.0,
                },
                f1: None,
                f2: LayerState {
                    critical_frequency_mhz: 1.2,
                    reflection_height_km: 320.0,
                },
            },
        };
        let engine = PredictionEngine::new(&config, &iono, &Isotropic, &Isotropic).unwrap();
        let ctx = engine.hour_context(3).unwrap();
        for f in [5.0, 10.0, 15.0, 21.0, 28.0] {
            let result = engine.evaluate(&ctx, f).unwrap();
            assert!(
                result.reliability < 0.01,
                "{f} MHz over a dead ionosphere gave reliability {}",
                result.reliability
            );
        }
    }

    #[test]
    fn no_geometry_yields_a_defined_empty_result() {
        // An 18,000 km circuit against layers too low for any hop split:
        // every candidate launches below the horizon.
        let mut config = midlat_config();
        config.transmitter = GeographicPoint::from_degrees(40.0, -105.0).unwrap();
        config.receiver = GeographicPoint::from_degrees(-35.0, 80.0).unwrap();
        let iono = FixedIonosphere {
            profile: LayerProfile {
                e: LayerState {
                    critical_frequency_mhz: 3.0,
                    reflection_height_km: 110.0,
                },
                f1: None,
                f2: LayerState {
                    critical_frequency_mhz: 6.0,
                    reflection_height_km: 100.0,
                },
            },
        };
        let engine = PredictionEngine::new(&config, &iono, &Isotropic, &Isotropic).unwrap();
        let result = engine.evaluate_at(12, 14.0).unwrap();
        assert_eq!(result.mode_count, 0);
        assert!(result.best_mode.is_none());
        assert!(result.best_loss.is_none());
        assert_eq!(result.reliability, 0.0);
        assert_eq!(result.circuit_muf_mhz, 0.0);
        assert_eq!(result.operational_muf_mhz, 0.0);
        assert!(result.snr.median() < -50.0);
    }

    #[test]
    fn operational_band_keys_on_eirp_at_the_dominant_mode() {
        // Summer daytime F2 dominance over a fixed profile. 500 W through an
        // isotropic radiator is 27 dBW EIRP, in the low power band; a flat
        // 5 dBi transmit pattern lifts it to 32 dBW, into the high band.
        let config = midlat_config();
        let iono = FixedIonosphere {
            profile: LayerProfile {
                e: LayerState {
                    critical_frequency_mhz: 3.0,
                    reflection_height_km: 110.0,
                },
                f1: None,
                f2: LayerState {
                    critical_frequency_mhz: 8.0,
                    reflection_height_km: 300.0,
                },
            },
        };
        let flat5 = PatternTable::new(vec![PatternPlane {
            frequency_mhz: 14.0,
            azimuth_step_deg: 90.0,
            elevation_step_deg: 30.0,
            gain_dbi: vec![vec![5.0; 4]; 4],
        }])
        .unwrap();

        let bare = PredictionEngine::new(&config, &iono, &Isotropic, &Isotropic).unwrap();
        let boosted = PredictionEngine::new(&config, &iono, &flat5, &Isotropic).unwrap();
        let low = bare.evaluate_at(18, 14.0).unwrap();
        let high = boosted.evaluate_at(18, 14.0).unwrap();

        assert!(low.best_mode.is_some());
        assert_eq!(low.circuit_muf_mhz, high.circuit_muf_mhz);
        assert!((low.operational_muf_mhz / low.circuit_muf_mhz - 1.10).abs() < 1e-9);
        assert!((high.operational_muf_mhz / high.circuit_muf_mhz - 1.25).abs() < 1e-9);
    }

    #[test]
    fn boundary_violations_fail_fast() {
        let config = midlat_config();
        let iono = ParametricIonosphere;
        let engine = PredictionEngine::new(&config, &iono, &Isotropic, &Isotropic).unwrap();
        assert!(matches!(
            engine.hour_context(24),
            Err(ConfigError::InvalidHour(24))
        ));
        let ctx = engine.hour_context(12).unwrap();
        assert!(matches!(
            engine.evaluate(&ctx, 40.0),
            Err(ConfigError::FrequencyOutOfBand(..))
        ));
        assert!(matches!(
            engine.evaluate(&ctx, -2.0),
            Err(ConfigError::InvalidFrequency(_))
        ));
    }

    #[test]
    fn more_power_never_hurts() {
        let mut strong = midlat_config();
        strong.link = LinkParameters::new(1000.0, 15.0, 2700.0).unwrap();
        let weak = midlat_config();
        let iono = ParametricIonosphere;

        let strong_engine = PredictionEngine::new(&strong, &iono, &Isotropic, &Isotropic).unwrap();
        let weak_engine = PredictionEngine::new(&weak, &iono, &Isotropic, &Isotropic).unwrap();
        for hour in [2, 8, 14, 20] {
            for f in [7.0, 14.0, 21.0] {
                let hi = strong_engine.evaluate_at(hour, f).unwrap();
                let lo = weak_engine.evaluate_at(hour, f).unwrap();
                assert!(hi.reliability >= lo.reliability - 1e-12);
            }
        }
    }
}
