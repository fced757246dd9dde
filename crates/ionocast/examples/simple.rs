use ionocast::*;

fn main() -> Result<(), ConfigError> {
    println!("ionocast HF Propagation Prediction - Simple Example");
    println!("===================================================");

    // Dublin to New York on 14 MHz, May, noon UTC, SSN 100.
    let config = CircuitConfig {
        transmitter: GeographicPoint::from_degrees(53.3, -6.2)?,
        receiver: GeographicPoint::from_degrees(40.7, -74.0)?,
        month: 5,
        indices: SolarIndices::from_ssn(100.0)?,
        link: LinkParameters::for_service(ServiceKind::VoiceSsb, 100.0)?,
        rx_environment: EnvironmentCategory::Residential,
    };
    let result = predict_circuit(&config, 12, 14.0)?;

    println!("\nPath: Dublin to New York");
    println!("Distance: {:.1} km", config.path()?.distance_km());
    println!("Frequency: {:.1} MHz at 12:00 UTC, May, SSN 100", 14.0);
    println!();

    println!("MUF statistics:");
    println!("  Circuit MUF (median): {:.2} MHz", result.circuit_muf_mhz);
    println!("  Operational MUF: {:.2} MHz", result.operational_muf_mhz);
    println!("  FOT: {:.2} MHz", result.fot_mhz);
    println!(
        "  MUF-day probability: {:.1}%",
        100.0 * result.muf_day_probability
    );
    println!();

    println!("Signal performance:");
    if let Some(mode) = result.best_mode {
        println!("  Best mode: {mode}");
    }
    if let Some(loss) = result.best_loss {
        println!("  Path loss: {:.2} dB", loss.total_db);
    }
    if let Some(power) = result.signal_power_dbw {
        println!("  Received power: {:.2} dBW", power);
    }
    println!(
        "  SNR: {:.2} dB (deciles {:.2} / {:.2})",
        result.snr.median(),
        result.snr.lower_decile(),
        result.snr.upper_decile()
    );
    println!("  Reliability: {:.1}%", 100.0 * result.reliability);
    println!();

    if result.reliability >= 0.9 {
        println!("Excellent circuit reliability");
    } else if result.reliability >= 0.7 {
        println!("Good circuit reliability");
    } else if result.reliability >= 0.5 {
        println!("Moderate circuit reliability");
    } else {
        println!("Poor circuit reliability");
    }
    Ok(())
}
