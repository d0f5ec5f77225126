use rand::SeedableRng;
use rand::rngs::StdRng;

use matchcast::bayes;
use matchcast::monte_carlo::sample_poisson;
use matchcast::poisson::{PoissonModel, poisson_pmf};
use matchcast::time_series;
use matchcast::types::SimulationContext;

#[test]
fn sampler_and_enumerated_distribution_agree_on_outcome_shares() {
    let model = PoissonModel::default();
    let (lh, la) = (1.6, 1.1);

    // Analytic home-win share from the truncated grid.
    let analytic: f64 = model
        .score_distribution(lh, la, 10)
        .iter()
        .filter(|c| c.home > c.away)
        .map(|c| c.prob)
        .sum();

    let mut rng = StdRng::seed_from_u64(17);
    let draws = 50_000;
    let mut wins = 0u32;
    for _ in 0..draws {
        if sample_poisson(lh, &mut rng) > sample_poisson(la, &mut rng) {
            wins += 1;
        }
    }
    let empirical = wins as f64 / draws as f64;
    assert!(
        (empirical - analytic).abs() < 0.01,
        "empirical {empirical} vs analytic {analytic}"
    );
}

#[test]
fn truncated_mass_grows_with_the_goal_cap() {
    let model = PoissonModel::default();
    let small: f64 = model.score_distribution(2.0, 1.5, 4).iter().map(|c| c.prob).sum();
    let large: f64 = model.score_distribution(2.0, 1.5, 8).iter().map(|c| c.prob).sum();
    assert!(large > small);
    assert!(large < 1.0 + 1e-9);
}

#[test]
fn pmf_zero_goals_matches_exponential() {
    for lambda in [0.5, 1.35, 2.8] {
        assert!((poisson_pmf(0, lambda) - (-lambda).exp()).abs() < 1e-12);
    }
}

#[test]
fn decomposition_round_trips_an_engine_style_series() {
    let series: Vec<f64> = (0..12)
        .map(|i| 75.0 + 7.0 * (i as f64 * 0.5).sin() + (i % 3) as f64)
        .collect();
    let d = time_series::decompose(&series, 4);
    for i in 0..series.len() {
        let rebuilt = d.trend[i] + d.seasonal[i] + d.residual[i];
        assert!((rebuilt - series[i]).abs() < 1e-9);
    }
}

#[test]
fn matchup_marginal_tracks_the_home_advantage_bias() {
    let neutral = bayes::infer(&SimulationContext::default());
    let fortress = bayes::infer(&SimulationContext {
        home_advantage: 1.3,
        ..SimulationContext::default()
    });
    let road = bayes::infer(&SimulationContext {
        home_advantage: 0.9,
        ..SimulationContext::default()
    });
    assert!(fortress.matchup[0] > neutral.matchup[0]);
    assert!(road.matchup[2] > neutral.matchup[2]);
}

#[test]
fn tempo_distribution_is_a_proper_distribution_in_all_weather() {
    use matchcast::types::Weather;
    for weather in [Weather::Clear, Weather::Rain, Weather::Windy, Weather::Extreme] {
        let inference = bayes::infer(&SimulationContext {
            weather,
            ..SimulationContext::default()
        });
        let p = inference.probabilities;
        assert!((p.high + p.medium + p.low - 1.0).abs() < 1e-9);
        assert!(inference.confidence >= 0.0 && inference.confidence <= 1.0);
    }
}
