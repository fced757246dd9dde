//! Around-the-clock band sweep with the ranked forecast.
//!
//! RUST_LOG=ionocast=debug shows the per-cell solver diagnostics.

use ionocast::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), ConfigError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = CircuitConfig {
        transmitter: GeographicPoint::from_degrees(51.5, -0.1)?, // London
        receiver: GeographicPoint::from_degrees(-33.9, 151.2)?,  // Sydney
        month: 3,
        indices: SolarIndices::from_ssn(120.0)?,
        link: LinkParameters::for_service(ServiceKind::NarrowbandData, 400.0)?,
        rx_environment: EnvironmentCategory::Residential,
    };
    let ionosphere = ParametricIonosphere;
    let engine = PredictionEngine::new(&config, &ionosphere, &Isotropic, &Isotropic)?;

    let bands = vec![3.5, 5.3, 7.1, 10.1, 14.1, 18.1, 21.1, 24.9, 28.2];
    let plan = SweepPlan::around_the_clock(bands.clone())?;
    let result = run_sweep(&engine, &plan, &CancellationToken::new())?;

    println!("London to Sydney, {:.0} km, March, SSN 120", engine.path().distance_km());
    println!();
    print!("UTC ");
    for band in &bands {
        print!("{band:>6.1}");
    }
    println!("  (reliability %)");
    for hour in 0..24 {
        print!("{hour:>3} ");
        for cell in result.cells().iter().filter(|c| c.hour_utc == hour) {
            print!("{:>6.0}", 100.0 * cell.reliability);
        }
        println!();
    }
    println!();

    println!("Top five (hour, frequency) picks:");
    for cell in result.ranked().take(5) {
        println!(
            "  {:02}:00 UTC {:>5.1} MHz  reliability {:>5.1}%  SNR {:>6.1} dB  MUF {:>5.1} MHz",
            cell.hour_utc,
            cell.frequency_mhz,
            100.0 * cell.reliability,
            cell.snr.median(),
            cell.circuit_muf_mhz
        );
    }
    Ok(())
}
