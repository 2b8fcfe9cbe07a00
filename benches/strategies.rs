use std::time::Instant;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use facloc::{
    cluster, online, run_trials, Area, DemandGenerator, ExperimentConfig, LloydConfig, MeyersonSession,
    OnlineParams, Point, UniformGenerator,
};

fn stream(n: usize) -> (Area, Vec<Point>) {
    let area = Area::default();
    let mut rng = ChaCha8Rng::seed_from_u64(0xFAC1_0C);
    let points = UniformGenerator.generate(n, &area, &mut rng);
    (area, points)
}

fn bench_online_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("online/run");
    for n in [100usize, 1_000] {
        let (_, points) = stream(n);
        group.throughput(Throughput::Elements(n as u64));
        for q in [1.0, 0.5] {
            let params = OnlineParams::new(40.0, q).unwrap();
            group.bench_with_input(BenchmarkId::new(format!("q={q}"), n), &points, |b, points| {
                b.iter(|| {
                    let mut rng = ChaCha8Rng::seed_from_u64(1);
                    online::run(points, &params, &mut rng).unwrap()
                });
            });
        }
    }
    group.finish();
}

fn bench_session_add_demand(c: &mut Criterion) {
    c.bench_function("online/session_add_demand", |b| {
        b.iter_custom(|iters| {
            // Fresh session per sample so the facility set does not grow across samples.
            let (area, points) = stream(1_000);
            let params = OnlineParams::classical(40.0).unwrap();
            let mut session = MeyersonSession::new(area, params, ChaCha8Rng::seed_from_u64(2)).unwrap();

            let start = Instant::now();
            for i in 0..iters {
                #[allow(clippy::cast_possible_truncation)]
                let p = points[(i as usize) % points.len()];
                let _ = session.add_demand(p).unwrap();
            }
            start.elapsed()
        });
    });
}

fn bench_lloyd(c: &mut Criterion) {
    let mut group = c.benchmark_group("clustering/lloyd");
    let config = LloydConfig::default();
    for n in [100usize, 1_000] {
        let (area, points) = stream(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &points, |b, points| {
            b.iter(|| {
                let mut rng = ChaCha8Rng::seed_from_u64(3);
                cluster(&area, points, &config, &mut rng).unwrap()
            });
        });
    }
    group.finish();
}

fn bench_compare_all_trials(c: &mut Criterion) {
    let config = ExperimentConfig::builder()
        .iterations(4)
        .seed(4)
        .build()
        .unwrap();
    c.bench_function("harness/compare_all_4_trials", |b| {
        b.iter(|| run_trials(config.clone()).unwrap());
    });
}

criterion_group!(
    benches,
    bench_online_run,
    bench_session_add_demand,
    bench_lloyd,
    bench_compare_all_trials
);
criterion_main!(benches);
