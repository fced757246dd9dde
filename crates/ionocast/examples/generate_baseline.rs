//! Capture the regression baseline for the reference circuit.
//!
//! Runs the same 9-frequency x 24-hour grid as `tests/regression.rs` and
//! writes the per-cell SNR medians and reliabilities to the baseline path
//! named in the scenario fixture. Run it from a build considered good;
//! afterwards the regression test compares every build against the stored
//! values.

use serde::{Deserialize, Serialize};
use std::fs;

use ionocast::*;

#[derive(Debug, Deserialize)]
struct Scenario {
    name: String,
    tx_lat: f64,
    tx_lon: f64,
    rx_lat: f64,
    rx_lon: f64,
    month: u32,
    ssn: f64,
    power_w: f64,
    bandwidth_hz: f64,
    required_snr_db: f64,
    rx_environment: EnvironmentCategory,
    frequencies_mhz: Vec<f64>,
    baseline: String,
}

#[derive(Debug, Serialize)]
struct BaselineCell {
    hour_utc: u32,
    frequency_mhz: f64,
    snr_median_db: f64,
    reliability: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let raw = fs::read_to_string("tests/regression_scenario.json")?;
    let s: Scenario = serde_json::from_str(&raw)?;

    let config = CircuitConfig {
        transmitter: GeographicPoint::from_degrees(s.tx_lat, s.tx_lon)?,
        receiver: GeographicPoint::from_degrees(s.rx_lat, s.rx_lon)?,
        month: s.month,
        indices: SolarIndices::from_ssn(s.ssn)?,
        link: LinkParameters::new(s.power_w, s.required_snr_db, s.bandwidth_hz)?,
        rx_environment: s.rx_environment,
    };
    let iono = ParametricIonosphere;
    let engine = PredictionEngine::new(&config, &iono, &Isotropic, &Isotropic)?;
    let plan = SweepPlan::around_the_clock(s.frequencies_mhz.clone())?;
    let swept = run_sweep(&engine, &plan, &CancellationToken::new())?;

    let cells: Vec<BaselineCell> = swept
        .cells()
        .iter()
        .map(|c| BaselineCell {
            hour_utc: c.hour_utc,
            frequency_mhz: c.frequency_mhz,
            snr_median_db: c.snr.median(),
            reliability: c.reliability,
        })
        .collect();

    println!("{}: {} cells", s.name, cells.len());
    fs::write(&s.baseline, serde_json::to_string_pretty(&cells)?)?;
    println!("baseline written to {}", s.baseline);
    Ok(())
}
