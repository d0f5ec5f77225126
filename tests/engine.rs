use matchcast::engine::{analyze_match, analyze_match_with, team_seed};
use matchcast::poisson::{MatchRecord, PoissonModel};
use matchcast::types::{SimulationContext, Weather};

const TEST_TRIALS: usize = 20_000;

fn neutral_context() -> SimulationContext {
    SimulationContext {
        weather: Weather::Clear,
        importance: 0.7,
        ..SimulationContext::default()
    }
}

#[test]
fn outcome_probabilities_sum_to_exactly_one_hundred() {
    let result = analyze_match("Team A", "Team B", Some(neutral_context()), TEST_TRIALS);
    let sum = result.win_prob + result.draw_prob + result.loss_prob;
    assert!((sum - 100.0).abs() < 0.01, "sum {sum}");
    assert!(result.win_prob >= 0.0);
    assert!(result.draw_prob >= 0.0);
    assert!(result.loss_prob >= 0.0);
}

#[test]
fn repeated_analyses_of_the_same_names_are_identical() {
    let a = analyze_match("Team A", "Team B", Some(neutral_context()), TEST_TRIALS);
    let b = analyze_match("Team A", "Team B", Some(neutral_context()), TEST_TRIALS);

    // Composite indices and the full probability output must reproduce:
    // all randomness flows from the name-derived seeds.
    assert_eq!(
        a.home_team.indices.offensive_power,
        b.home_team.indices.offensive_power
    );
    assert_eq!(a.home_team.performance_series, b.home_team.performance_series);
    assert_eq!(a.win_prob, b.win_prob);
    assert_eq!(a.draw_prob, b.draw_prob);
    assert_eq!(a.exact_score, b.exact_score);
    assert_eq!(a.confidence_index, b.confidence_index);
    assert_eq!(
        a.genetic_metrics.home.convergence,
        b.genetic_metrics.home.convergence
    );
}

#[test]
fn missing_context_falls_back_to_neutral_and_still_completes() {
    let result = analyze_match("Team A", "Team B", None, TEST_TRIALS);
    let sum = result.win_prob + result.draw_prob + result.loss_prob;
    assert!((sum - 100.0).abs() < 0.01);
    assert!(!result.top_scores.is_empty());
    assert!(result.expected_goals.home > 0.0);
    assert!(result.expected_goals.away > 0.0);
}

#[test]
fn result_is_fully_serializable() {
    let result = analyze_match("Team A", "Team B", Some(neutral_context()), TEST_TRIALS);
    let json = serde_json::to_string(&result).expect("serializes");
    let back: matchcast::PredictionResult = serde_json::from_str(&json).expect("round-trips");
    assert_eq!(back.win_prob, result.win_prob);
    assert_eq!(back.home_team.name, "Team A");
}

#[test]
fn genetic_convergence_history_is_non_decreasing_in_results() {
    let result = analyze_match("Team A", "Team B", Some(neutral_context()), TEST_TRIALS);
    for side in [&result.genetic_metrics.home, &result.genetic_metrics.away] {
        assert_eq!(side.convergence.len(), 12);
        for pair in side.convergence.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
        assert_eq!(*side.convergence.last().unwrap(), side.best_fitness);
    }
}

#[test]
fn value_bets_carry_consistent_fair_odds() {
    let result = analyze_match("Team A", "Team B", Some(neutral_context()), TEST_TRIALS);
    let probs = [
        ("Home win", result.win_prob),
        ("Draw", result.draw_prob),
        ("Away win", result.loss_prob),
    ];
    for bet in &result.value_bets {
        assert!(bet.edge >= 5.0, "edge {} below threshold", bet.edge);
        let prob = probs
            .iter()
            .find(|(name, _)| *name == bet.market)
            .map(|(_, p)| p / 100.0)
            .expect("bet maps to an outcome");
        let fair = (1.0 / prob.max(1e-6) * 100.0).round() / 100.0;
        assert!((bet.fair_odds - fair).abs() < 1e-9);
    }
}

#[test]
fn bootstrap_intervals_bracket_a_plausible_outcome_range() {
    let result = analyze_match("Team A", "Team B", Some(neutral_context()), TEST_TRIALS);
    let ci = result.confidence_intervals;
    for interval in [ci.win, ci.draw, ci.loss] {
        assert!(interval.lower <= interval.upper);
        assert!(interval.lower >= 0.0);
        assert!(interval.upper <= 100.0);
    }
}

#[test]
fn extreme_weather_suppresses_scoring() {
    let clear = analyze_match("Team A", "Team B", Some(neutral_context()), TEST_TRIALS);
    let extreme_ctx = SimulationContext {
        weather: Weather::Extreme,
        ..neutral_context()
    };
    let extreme = analyze_match("Team A", "Team B", Some(extreme_ctx), TEST_TRIALS);
    assert!(extreme.expected_goals.home < clear.expected_goals.home);
    assert!(extreme.expected_goals.away < clear.expected_goals.away);
}

#[test]
fn trained_model_shifts_probabilities_toward_the_stronger_side() {
    let mut history = Vec::new();
    for _ in 0..30 {
        history.push(MatchRecord {
            home: "Giants".into(),
            away: "Minnows".into(),
            home_goals: 3,
            away_goals: 0,
        });
        history.push(MatchRecord {
            home: "Minnows".into(),
            away: "Giants".into(),
            home_goals: 0,
            away_goals: 2,
        });
    }
    let mut model = PoissonModel::default();
    model.train(&history);

    let trained = analyze_match_with(&model, "Giants", "Minnows", None, TEST_TRIALS);
    let untrained = analyze_match("Giants", "Minnows", None, TEST_TRIALS);
    assert!(trained.win_prob > untrained.win_prob);
}

#[test]
fn team_seed_matches_between_direct_and_analysis_use() {
    // The profile embedded in the result must be the one the seed builds.
    let seed = team_seed("Team A");
    assert_eq!(seed, team_seed("Team A"));
    let result = analyze_match("Team A", "Team B", None, TEST_TRIALS);
    assert_eq!(result.home_team.name, "Team A");
    assert_eq!(result.away_team.name, "Team B");
}
