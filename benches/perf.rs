use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use rand::SeedableRng;
use rand::rngs::StdRng;

use matchcast::engine::{self, team_seed};
use matchcast::monte_carlo;
use matchcast::poisson::PoissonModel;
use matchcast::types::SimulationContext;

fn bench_score_distribution(c: &mut Criterion) {
    let model = PoissonModel::default();
    c.bench_function("score_distribution", |b| {
        b.iter(|| {
            let grid = model.score_distribution(black_box(1.8), black_box(1.1), 8);
            black_box(grid.len());
        })
    });
}

fn bench_deep_profile(c: &mut Criterion) {
    c.bench_function("deep_profile", |b| {
        b.iter(|| {
            let seed = team_seed("Benchmark United");
            let mut rng = StdRng::seed_from_u64(seed);
            let profile = engine::build_deep_profile(black_box("Benchmark United"), seed, &mut rng);
            black_box(profile.genetic.best_fitness);
        })
    });
}

fn bench_monte_carlo_10k(c: &mut Criterion) {
    let model = PoissonModel::default();
    let ctx = SimulationContext::default();
    let home_seed = team_seed("Benchmark United");
    let away_seed = team_seed("Benchmark City");
    let mut home_rng = StdRng::seed_from_u64(home_seed);
    let mut away_rng = StdRng::seed_from_u64(away_seed);
    let home = engine::build_deep_profile("Benchmark United", home_seed, &mut home_rng).profile;
    let away = engine::build_deep_profile("Benchmark City", away_seed, &mut away_rng).profile;

    c.bench_function("monte_carlo_10k", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(99);
            let outcome = monte_carlo::simulate_match(
                black_box(&home),
                black_box(&away),
                &model,
                &ctx,
                10_000,
                &mut rng,
            );
            black_box(outcome.win);
        })
    });
}

fn bench_full_analysis(c: &mut Criterion) {
    c.bench_function("full_analysis_20k", |b| {
        b.iter(|| {
            let result = engine::analyze_match(
                black_box("Benchmark United"),
                black_box("Benchmark City"),
                None,
                20_000,
            );
            black_box(result.win_prob);
        })
    });
}

criterion_group!(
    perf,
    bench_score_distribution,
    bench_deep_profile,
    bench_monte_carlo_10k,
    bench_full_analysis
);
criterion_main!(perf);
