//! 测地线计算基准
//!
//! 1. Christoffel 符号计算
//! 2. 1000 步 RK4 积分
//! 3. 1000 条观测的偏离信号
//!
//! cargo bench --bench geodesic -p spacetime-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nalgebra::Matrix3;

use spacetime_core::{
    ConnectionCalculator, DeviationSignalBuilder, GeodesicIntegrator, Metric, MetricMatrix,
    Observation, PhaseState, Point, TangentVector,
};

fn curved_metric() -> Metric {
    Metric::from_fn(|x| {
        let s = 0.2 + 0.05 * (x[0] * 0.1).sin();
        MetricMatrix::from_diagonal(&Point::new(-1.0, s * s, 0.09, 0.04))
    })
}

fn observations(n: usize) -> Vec<Observation> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            Observation::new(t, 100.0 + (t * 0.05).sin(), 1000.0 + (t * 0.3).cos() * 50.0, (t * 0.1).sin() * 0.01)
        })
        .collect()
}

fn bench_connection(c: &mut Criterion) {
    let mut group = c.benchmark_group("connection");
    let x = Point::new(1.0, 100.0, 1000.0, 0.0);
    for (name, metric) in [
        ("minkowski", Metric::minkowski(1.0, 1.0)),
        ("covariance", Metric::from_covariance(1.0, Matrix3::new(0.04, 0.01, 0.0, 0.01, 0.09, 0.0, 0.0, 0.0, 0.01))),
        ("curved", curved_metric()),
    ] {
        let cs = ConnectionCalculator::with_default_step(metric);
        group.bench_function(name, |b| b.iter(|| cs.compute(black_box(&x))));
    }
    group.finish();
}

fn bench_integration(c: &mut Criterion) {
    let mut group = c.benchmark_group("geodesic");
    let integrator = GeodesicIntegrator::default();
    let init = PhaseState::new(Point::zeros(), TangentVector::new(1.0, 0.1, 0.0, 0.0));
    for steps in [100usize, 1000] {
        group.throughput(Throughput::Elements(steps as u64));
        let metric = curved_metric();
        group.bench_with_input(BenchmarkId::new("solve", steps), &steps, |b, &n| {
            b.iter(|| integrator.solve(black_box(init), &metric, n, 0.01))
        });
    }
    group.finish();
}

fn bench_signal(c: &mut Criterion) {
    let mut group = c.benchmark_group("deviation_signal");
    let obs = observations(1000);
    group.throughput(Throughput::Elements(obs.len() as u64));
    let builder = DeviationSignalBuilder::new(Metric::diagonal(1.0, [0.2, 0.5, 1.0]), 0.01);
    group.bench_function("diagonal_1000", |b| b.iter(|| builder.compute(black_box(&obs))));
    group.finish();
}

criterion_group!(benches, bench_connection, bench_integration, bench_signal);
criterion_main!(benches);
