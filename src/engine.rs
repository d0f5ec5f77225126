use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::bayes;
use crate::genetic::{self, GaConfig};
use crate::matrix::{self, FeatureTable, PcaSummary};
use crate::monte_carlo::{self, SimulationOutcome};
use crate::poisson::PoissonModel;
use crate::time_series;
use crate::types::{
    BayesianMetrics, CompositeIndices, EnsembleMetrics, HomeAway, PerformanceForecast,
    PredictionResult, SimulationContext, TeamProfile, TimeSeriesAnalytics, TopScore, Trend,
    ValueBet,
};

// Fixed ensemble weights; must sum to 1.
const W_POISSON: f64 = 0.35;
const W_MONTE_CARLO: f64 = 0.40;
const W_BAYESIAN: f64 = 0.25;
const MODEL_CONVERGENCE: f64 = 0.94;

const VALUE_BET_EDGE_THRESHOLD: f64 = 0.05;

const SMOOTHING_ALPHA: f64 = 0.3;
const MOMENTUM_DEADBAND: f64 = 0.2;

/// Everything `build_deep_profile` learns about one team.
#[derive(Debug, Clone)]
pub struct DeepProfile {
    pub profile: TeamProfile,
    pub genetic: crate::types::GeneticMetrics,
    pub analytics: TimeSeriesAnalytics,
    pub pca: PcaSummary,
    /// Covariance between the attack and defense feature columns.
    pub covariance_impact: f64,
}

/// Fused per-match diagnostic before final result assembly.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub win: f64,
    pub draw: f64,
    pub loss: f64,
    pub simulation: SimulationOutcome,
    pub top_scores: Vec<TopScore>,
    pub value_bets: Vec<ValueBet>,
    pub confidence: f64,
    pub bayesian_metrics: BayesianMetrics,
    pub ensemble_metrics: EnsembleMetrics,
}

/// Deterministic seed for a team name (rolling 32-bit string hash), so
/// repeated analyses of the same name reproduce the same profile.
pub fn team_seed(name: &str) -> u64 {
    let mut acc: i32 = 0;
    for c in name.chars() {
        acc = acc.wrapping_shl(5).wrapping_sub(acc).wrapping_add(c as i32);
    }
    acc.unsigned_abs() as u64
}

/// Builds the deep per-team profile: synthetic performance series,
/// time-series analytics, covariance/PCA over a feature sample,
/// exponential smoothing into composite indices, genetic calibration of
/// those indices, and a short-horizon forecast.
pub fn build_deep_profile(name: &str, seed: u64, rng: &mut StdRng) -> DeepProfile {
    let performance_series: Vec<f64> = (0..12)
        .map(|i| {
            75.0 + (seed % 15) as f64 + (i as f64 * 0.5).sin() * 8.0 + rng.gen_range(-2.5..2.5)
        })
        .collect();

    let analytics = time_series::analyze(&performance_series, rng);

    let mut features = FeatureTable::new(&["atk", "def", "mid"]);
    for i in 0..10 {
        features.push_row(vec![
            70.0 + (seed % 20) as f64 + (i as f64).sin() * 5.0,
            65.0 + (seed % 15) as f64 + (i as f64).cos() * 5.0,
            75.0 + (seed % 10) as f64,
        ]);
    }
    let pca = matrix::principal_components(&features, 2);
    let cov = matrix::covariance_matrix(&features);
    let covariance_impact = if cov.len() > 1 { cov[0][1] } else { 0.0 };

    let momentum_base = (performance_series[11] - performance_series[0]) / 100.0;
    let raw = composite_indices(seed, momentum_base);

    // Calibration fitness: balanced attack/defense, high motivation,
    // positive momentum.
    let (optimized, best_fitness, convergence) = genetic::optimize_indices(
        &GaConfig::default(),
        &raw,
        |ix| {
            let imbalance = (ix.offensive_power - ix.defensive_solidity).abs();
            100.0 - imbalance * 0.8 + ix.motivation * 0.2 + ix.momentum * 5.0
        },
        rng,
    );

    let forecast = forecast_performance(&optimized);

    DeepProfile {
        profile: TeamProfile {
            name: name.to_string(),
            indices: optimized,
            attack_power: optimized.offensive_power.round(),
            midfield_power: 75.0 + (seed % 10) as f64,
            defense_power: optimized.defensive_solidity.round(),
            performance_series,
            forecast,
        },
        genetic: crate::types::GeneticMetrics {
            best_fitness,
            convergence,
            optimized_genes: optimized,
        },
        analytics,
        pca,
        covariance_impact,
    }
}

/// Exponential smoothing (alpha = 0.3) of a seed-derived history into
/// the raw composite indices the optimizer starts from.
fn composite_indices(seed: u64, momentum_base: f64) -> CompositeIndices {
    let historical: Vec<f64> = (0..5u64).map(|i| 70.0 + (seed % (10 + i)) as f64).collect();
    let mut smoothed = historical[0];
    for value in &historical[1..] {
        smoothed = SMOOTHING_ALPHA * value + (1.0 - SMOOTHING_ALPHA) * smoothed;
    }

    CompositeIndices {
        offensive_power: smoothed * 1.1,
        defensive_solidity: smoothed * 0.95,
        home_advantage: 1.12,
        momentum: momentum_base,
        fatigue: 10.0 + (seed % 15) as f64,
        motivation: 85.0 + (seed % 10) as f64,
    }
}

fn forecast_performance(indices: &CompositeIndices) -> PerformanceForecast {
    let base = indices.offensive_power;
    let trend_factor = if indices.momentum > 0.0 { 1.05 } else { 0.95 };
    let trend = if indices.momentum > MOMENTUM_DEADBAND {
        Trend::Up
    } else if indices.momentum < -MOMENTUM_DEADBAND {
        Trend::Down
    } else {
        Trend::Stable
    };

    PerformanceForecast {
        smoothed: base,
        trend,
        seasonality: 1.02,
        forecast: base * trend_factor * 1.02,
    }
}

/// Fuses the three model opinions into final outcome probabilities,
/// value bets and a ranked score distribution.
pub fn compute_final_diagnostic(
    home: &TeamProfile,
    away: &TeamProfile,
    model: &PoissonModel,
    ctx: &SimulationContext,
    trials: usize,
    rng: &mut StdRng,
) -> Diagnostic {
    let inference = bayes::infer(ctx);
    let simulation = monte_carlo::simulate_match(home, away, model, ctx, trials, rng);

    // Map the categorical tempo distribution onto an outcome tilt.
    let p = inference.probabilities;
    let bayes_win = p.high * 0.7 + p.medium * 0.4;
    let bayes_loss = p.low * 0.6 + p.medium * 0.2;
    let bayes_draw = 1.0 - bayes_win - bayes_loss;

    // The Poisson opinion is derived from the simulator's frequencies
    // with per-outcome skews (draws slightly up, both wins down).
    let ensemble_win =
        simulation.win * W_MONTE_CARLO + simulation.win * 0.9 * W_POISSON + bayes_win * 100.0 * W_BAYESIAN;
    let ensemble_draw = simulation.draw * W_MONTE_CARLO
        + simulation.draw * 1.1 * W_POISSON
        + bayes_draw * 100.0 * W_BAYESIAN;
    let ensemble_loss = simulation.loss * W_MONTE_CARLO
        + simulation.loss * 0.95 * W_POISSON
        + bayes_loss * 100.0 * W_BAYESIAN;

    let (win, draw, loss) = normalize_to_hundred(ensemble_win, ensemble_draw, ensemble_loss);

    let value_bets = detect_value_bets(win, draw, loss, rng);

    // Cosmetic jitter, not a statistical derivation: confident band when
    // the simulated spread is tight, a lower band otherwise.
    let confidence = if simulation.risk_metrics.volatility < 3.0 {
        0.92 + rng.gen_range(0.0..0.05)
    } else {
        0.85 + rng.gen_range(0.0..0.05)
    };

    let top_scores: Vec<TopScore> = model
        .score_distribution(
            simulation.expected_goals.home,
            simulation.expected_goals.away,
            6,
        )
        .iter()
        .take(5)
        .map(|cell| TopScore {
            score: cell.label(),
            probability: cell.prob * 100.0,
        })
        .collect();

    let tactical_advantage = if inference.matchup[0] >= inference.matchup[1]
        && inference.matchup[0] >= inference.matchup[2]
    {
        0.8
    } else {
        0.5
    };

    Diagnostic {
        win,
        draw,
        loss,
        simulation,
        top_scores,
        value_bets,
        confidence,
        bayesian_metrics: BayesianMetrics {
            entropy: inference.entropy,
            tactical_advantage,
            inference_confidence: inference.confidence,
        },
        ensemble_metrics: EnsembleMetrics {
            poisson_weight: W_POISSON,
            monte_carlo_weight: W_MONTE_CARLO,
            bayesian_weight: W_BAYESIAN,
            convergence: MODEL_CONVERGENCE,
        },
    }
}

/// Rescale to percentages, round to two decimals, and fold the rounding
/// residue into the draw so the three always sum to exactly 100.
fn normalize_to_hundred(win: f64, draw: f64, loss: f64) -> (f64, f64, f64) {
    let total = (win + draw + loss).max(1e-9);
    let win = round2(win / total * 100.0);
    let loss = round2(loss / total * 100.0);
    let draw = round2(100.0 - win - loss);
    (win, draw, loss)
}

fn detect_value_bets(win: f64, draw: f64, loss: f64, rng: &mut StdRng) -> Vec<ValueBet> {
    let outcomes = [
        ("Home win", win / 100.0),
        ("Draw", draw / 100.0),
        ("Away win", loss / 100.0),
    ];

    let mut bets = Vec::new();
    for (market, prob) in outcomes {
        let prob = prob.max(1e-6);
        let fair_odds = 1.0 / prob;
        // Simulated market price: bookmaker-margin-like jitter, not a
        // real odds feed.
        let market_odds = fair_odds * (0.95 + rng.gen_range(0.0..0.15));
        let edge = prob * market_odds - 1.0;
        if edge > VALUE_BET_EDGE_THRESHOLD {
            bets.push(ValueBet {
                market: market.to_string(),
                fair_odds: round2(fair_odds),
                market_odds: round2(market_odds),
                edge: round2(edge * 100.0),
            });
        }
    }
    bets
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Full per-match analysis against an untrained (fallback-strength)
/// Poisson model.
pub fn analyze_match(
    home_name: &str,
    away_name: &str,
    ctx: Option<SimulationContext>,
    trials: usize,
) -> PredictionResult {
    analyze_match_with(&PoissonModel::default(), home_name, away_name, ctx, trials)
}

/// Full per-match analysis: two deep profiles built in parallel, then
/// the ensemble diagnostic. Each stage runs on its own seed-derived RNG
/// so the whole result is reproducible for the same names and context;
/// a missing context falls back to the neutral default.
pub fn analyze_match_with(
    model: &PoissonModel,
    home_name: &str,
    away_name: &str,
    ctx: Option<SimulationContext>,
    trials: usize,
) -> PredictionResult {
    let ctx = ctx.unwrap_or_default();
    let home_seed = team_seed(home_name);
    let away_seed = team_seed(away_name);

    // The two builds share no mutable state; each is pure given its seed.
    let (deep_home, deep_away) = rayon::join(
        || {
            let mut rng = StdRng::seed_from_u64(home_seed);
            build_deep_profile(home_name, home_seed, &mut rng)
        },
        || {
            let mut rng = StdRng::seed_from_u64(away_seed);
            build_deep_profile(away_name, away_seed, &mut rng)
        },
    );

    let mut rng = StdRng::seed_from_u64(home_seed.wrapping_mul(31).wrapping_add(away_seed));
    let diagnostic = compute_final_diagnostic(
        &deep_home.profile,
        &deep_away.profile,
        model,
        &ctx,
        trials,
        &mut rng,
    );

    let exact_score = diagnostic
        .top_scores
        .first()
        .map(|s| s.score.clone())
        .unwrap_or_else(|| "0-0".to_string());

    PredictionResult {
        home_team: deep_home.profile,
        away_team: deep_away.profile,
        win_prob: diagnostic.win,
        draw_prob: diagnostic.draw,
        loss_prob: diagnostic.loss,
        expected_goals: diagnostic.simulation.expected_goals,
        exact_score,
        top_scores: diagnostic.top_scores,
        value_bets: diagnostic.value_bets,
        confidence_index: round2(diagnostic.confidence * 100.0),
        confidence_intervals: diagnostic.simulation.confidence_intervals,
        risk_metrics: diagnostic.simulation.risk_metrics,
        bayesian_metrics: diagnostic.bayesian_metrics,
        genetic_metrics: HomeAway {
            home: deep_home.genetic,
            away: deep_away.genetic,
        },
        time_series: HomeAway {
            home: deep_home.analytics,
            away: deep_away.analytics,
        },
        ensemble_metrics: diagnostic.ensemble_metrics,
    }
}
