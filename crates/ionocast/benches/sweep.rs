use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ionocast::*;

fn planning_config() -> CircuitConfig {
    CircuitConfig {
        transmitter: GeographicPoint::from_degrees(40.0, -105.3).unwrap(),
        receiver: GeographicPoint::from_degrees(38.9, -77.0).unwrap(),
        month: 10,
        indices: SolarIndices::from_ssn(100.0).unwrap(),
        link: LinkParameters::for_service(ServiceKind::VoiceSsb, 500.0).unwrap(),
        rx_environment: EnvironmentCategory::Rural,
    }
}

fn bench_single_evaluation(c: &mut Criterion) {
    let config = planning_config();
    let iono = ParametricIonosphere;
    let engine = PredictionEngine::new(&config, &iono, &Isotropic, &Isotropic).unwrap();
    let ctx = engine.hour_context(18).unwrap();

    c.bench_function("evaluate_one_cell", |b| {
        b.iter(|| engine.evaluate(&ctx, black_box(14.2)).unwrap())
    });
}

fn bench_full_sweep(c: &mut Criterion) {
    let config = planning_config();
    let iono = ParametricIonosphere;
    let engine = PredictionEngine::new(&config, &iono, &Isotropic, &Isotropic).unwrap();
    let plan = SweepPlan::around_the_clock(vec![
        3.2, 5.1, 7.1, 9.7, 11.9, 14.2, 17.6, 21.5, 25.9,
    ])
    .unwrap();

    c.bench_function("sweep_24h_9freq", |b| {
        b.iter(|| run_sweep(&engine, black_box(&plan), &CancellationToken::new()).unwrap())
    });
}

criterion_group!(benches, bench_single_evaluation, bench_full_sweep);
criterion_main!(benches);
