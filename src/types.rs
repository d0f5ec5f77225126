use serde::{Deserialize, Serialize};

/// Qualitative weather bucket used by the Poisson context modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Weather {
    #[default]
    Clear,
    Rain,
    Windy,
    Extreme,
}

impl Weather {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "clear" => Some(Weather::Clear),
            "rain" => Some(Weather::Rain),
            "windy" => Some(Weather::Windy),
            "extreme" => Some(Weather::Extreme),
            _ => None,
        }
    }
}

/// Match conditions shared by every model in one analysis. Read-only once
/// built; the Monte Carlo simulator perturbs per-trial copies, never this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationContext {
    pub weather: Weather,
    pub home_advantage: f64,
    pub fatigue: f64,
    pub motivation: f64,
    /// 0.0 (dead rubber) .. 1.0 (final/derby).
    pub importance: f64,
}

impl Default for SimulationContext {
    /// Neutral context, used whenever the external enrichment layer has
    /// nothing to say. The engine must always be able to run on this.
    fn default() -> Self {
        Self {
            weather: Weather::Clear,
            home_advantage: 1.15,
            fatigue: 10.0,
            motivation: 85.0,
            importance: 0.7,
        }
    }
}

/// Per-team scalar summary features driving every downstream model.
/// The genetic optimizer treats this as its search vector, so it must
/// stay a flat record of numeric fields (JSON round-trippable).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompositeIndices {
    pub offensive_power: f64,
    pub defensive_solidity: f64,
    pub home_advantage: f64,
    /// -1.0 .. 1.0, sign of recent form drift.
    pub momentum: f64,
    pub fatigue: f64,
    pub motivation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PerformanceForecast {
    pub smoothed: f64,
    pub trend: Trend,
    pub seasonality: f64,
    pub forecast: f64,
}

/// Everything the engine knows about one side of the match. Built once
/// per analysis from the team's seed and owned by that analysis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamProfile {
    pub name: String,
    pub indices: CompositeIndices,
    /// 0-100 scale, mirrors the composite indices after optimization.
    pub attack_power: f64,
    pub midfield_power: f64,
    pub defense_power: f64,
    pub performance_series: Vec<f64>,
    pub forecast: PerformanceForecast,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExpectedGoals {
    pub home: f64,
    pub away: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Binomial-spread proxy: sqrt(win% * (100 - win%)) / 10.
    pub volatility: f64,
    /// Mean absolute goal-difference rate across trials.
    pub unexpected_factor: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OutcomeIntervals {
    pub win: ConfidenceInterval,
    pub draw: ConfidenceInterval,
    pub loss: ConfidenceInterval,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueBet {
    pub market: String,
    pub fair_odds: f64,
    pub market_odds: f64,
    /// Percent edge over the simulated market price.
    pub edge: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnsembleMetrics {
    pub poisson_weight: f64,
    pub monte_carlo_weight: f64,
    pub bayesian_weight: f64,
    pub convergence: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BayesianMetrics {
    /// Shannon entropy of the score-tempo distribution, in bits.
    pub entropy: f64,
    pub tactical_advantage: f64,
    pub inference_confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneticMetrics {
    pub best_fitness: f64,
    /// Running best fitness per generation; non-decreasing.
    pub convergence: Vec<f64>,
    pub optimized_genes: CompositeIndices,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decomposition {
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastBand {
    pub values: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityFit {
    pub conditional: Vec<f64>,
    pub var95: f64,
    pub expected_shortfall: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeriesAnalytics {
    pub decomposition: Decomposition,
    pub forecast: ForecastBand,
    pub volatility: VolatilityFit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopScore {
    pub score: String,
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeAway<T> {
    pub home: T,
    pub away: T,
}

/// Final fused forecast. Self-contained and serializable: no references
/// back into engine state, ownership moves to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub home_team: TeamProfile,
    pub away_team: TeamProfile,
    /// Percentages; the three always renormalize to exactly 100.
    pub win_prob: f64,
    pub draw_prob: f64,
    pub loss_prob: f64,
    pub expected_goals: ExpectedGoals,
    pub exact_score: String,
    pub top_scores: Vec<TopScore>,
    pub value_bets: Vec<ValueBet>,
    pub confidence_index: f64,
    pub confidence_intervals: OutcomeIntervals,
    pub risk_metrics: RiskMetrics,
    pub bayesian_metrics: BayesianMetrics,
    pub genetic_metrics: HomeAway<GeneticMetrics>,
    pub time_series: HomeAway<TimeSeriesAnalytics>,
    pub ensemble_metrics: EnsembleMetrics,
}
