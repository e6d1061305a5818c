//! Criterion benchmarks for formulation, search and decoding.
//!
//! Uses seeded generated instances so runs are comparable.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use u_mrcpsp::decode::decode;
use u_mrcpsp::formulation::formulate;
use u_mrcpsp::instance::{GeneratorConfig, InstanceGenerator, ProjectInstance};
use u_mrcpsp::solver::{SearchSolver, Solver, SolverConfig};

fn instance(jobs: usize, horizon: u32) -> ProjectInstance {
    let config = GeneratorConfig::default()
        .with_jobs(jobs)
        .with_horizon(horizon)
        .with_seed(42);
    InstanceGenerator::new(config)
        .generate()
        .expect("generator config is valid")
}

fn bench_formulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("formulate");
    group.sample_size(10);

    for &(jobs, horizon) in &[(6, 20), (18, 30), (30, 60)] {
        let inst = instance(jobs, horizon);
        group.bench_with_input(
            BenchmarkId::new(format!("j{}_h{}", jobs, horizon), jobs),
            &inst,
            |b, inst| b.iter(|| black_box(formulate(black_box(inst)))),
        );
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);

    let config = SolverConfig::default().with_time_limit_seconds(10);
    for &jobs in &[4, 6, 8] {
        let system = formulate(&instance(jobs, 24));
        group.bench_with_input(BenchmarkId::from_parameter(jobs), &system, |b, sys| {
            b.iter(|| black_box(SearchSolver::new().solve(black_box(sys), &config)))
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let system = formulate(&instance(18, 30));
    let outcome = SearchSolver::new().solve(&system, &SolverConfig::relaxed());
    let Some(assignment) = outcome.assignment else {
        return;
    };
    c.bench_function("decode_j18_h30", |b| {
        b.iter(|| black_box(decode(black_box(&system), black_box(&assignment))))
    });
}

criterion_group!(benches, bench_formulate, bench_search, bench_decode);
criterion_main!(benches);
