//! Benchmarks of the per-trial calculations.

use calib_lib::flexion_trial::{local_cor_offset, score_trajectory};
use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::{Quaternion, Vector3};

fn trial_calcs_benchmark(c: &mut Criterion) {
    let human_m = Vector3::new(0.31, 0.02, -0.05);
    let act_m = Vector3::new(0.30, 0.00, -0.05);
    let half_angle = 0.4f64;
    let quat = Quaternion::new(half_angle.cos(), 0.0, 0.0, half_angle.sin());

    c.bench_function("local_cor_offset", |b| {
        b.iter(|| local_cor_offset(&human_m, &act_m, &quat))
    });

    // A full flexion motion's worth of samples
    let trajectory: Vec<_> = (0..200)
        .map(|i| Vector3::new(0.001 * i as f64, -0.0005 * i as f64, 0.0002))
        .collect();

    c.bench_function("score_trajectory", |b| {
        b.iter(|| score_trajectory(&trajectory))
    });
}

criterion_group!(benches, trial_calcs_benchmark);
criterion_main!(benches);
