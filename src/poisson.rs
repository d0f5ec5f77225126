use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{ConfidenceInterval, SimulationContext, TeamProfile, Weather};

const DEFAULT_HOME_ADVANTAGE: f64 = 1.22;
const DEFAULT_LEAGUE_AVG_GOALS: f64 = 1.35;

// Log-space exponents damping the contextual multipliers.
const MOTIVATION_EXP: f64 = 0.4;
const FATIGUE_EXP: f64 = 0.3;
const WEATHER_EXP: f64 = 0.1;

const TRAIN_CONVERGENCE: f64 = 1e-6;
const TRAIN_MAX_ITERATIONS: usize = 500;
/// Smoothing floor on observed goals conceded in training, in goals.
const CONCEDED_FLOOR: f64 = 0.5;

/// One finished match used to fit attack/defense strengths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub home: String,
    pub away: String,
    pub home_goals: u32,
    pub away_goals: u32,
}

/// Joint score cell of the enumerated distribution, sorted descending
/// by probability with a running cumulative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreProb {
    pub home: u32,
    pub away: u32,
    pub prob: f64,
    pub cumulative: f64,
}

impl ScoreProb {
    pub fn label(&self) -> String {
        format!("{}-{}", self.home, self.away)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExtraMarkets {
    /// Both teams to score, percent.
    pub btts: f64,
    /// Over 2.5 total goals, percent.
    pub over25: f64,
}

/// Poisson scoring-rate model. Strength maps start empty and fall back
/// to `power / 100` until `train` has run; reads after training are
/// safe to share across threads (the maps are write-once per run).
#[derive(Debug, Clone)]
pub struct PoissonModel {
    attack_strength: HashMap<String, f64>,
    defense_strength: HashMap<String, f64>,
    pub home_advantage: f64,
    pub league_average_goals: f64,
}

impl Default for PoissonModel {
    fn default() -> Self {
        Self {
            attack_strength: HashMap::new(),
            defense_strength: HashMap::new(),
            home_advantage: DEFAULT_HOME_ADVANTAGE,
            league_average_goals: DEFAULT_LEAGUE_AVG_GOALS,
        }
    }
}

impl PoissonModel {
    /// Expected goals for `team` against `opponent` under `ctx`.
    ///
    /// Base rate is league average x attack x 1/defense x home factor.
    /// The three contextual multipliers are combined in log space with
    /// fixed exponents, so an extreme single factor moves lambda less
    /// than naive multiplication would.
    pub fn lambda(
        &self,
        team: &TeamProfile,
        opponent: &TeamProfile,
        is_home: bool,
        ctx: &SimulationContext,
    ) -> f64 {
        let attack = self
            .attack_strength
            .get(&team.name)
            .copied()
            .unwrap_or_else(|| power_fallback(team.attack_power));
        let defense = self
            .defense_strength
            .get(&opponent.name)
            .copied()
            .unwrap_or_else(|| power_fallback(opponent.defense_power));

        let home_factor = if is_home { self.home_advantage } else { 1.0 };
        let defense = if defense > 0.0 { defense } else { 1.0 };
        let base = self.league_average_goals * attack * (1.0 / defense) * home_factor;

        // Saturates near 1.15 for a fully motivated side.
        let motivation_factor = 0.95 + team.indices.motivation / 400.0;
        // Saturates near 0.98 for a rested side, lower when run down.
        let fatigue_factor = 1.0 - team.indices.fatigue / 500.0;
        let weather_factor = weather_modifier(ctx.weather);

        let modulator = (motivation_factor.ln() * MOTIVATION_EXP
            + fatigue_factor.max(1e-6).ln() * FATIGUE_EXP
            + weather_factor.ln() * WEATHER_EXP)
            .exp();

        (base * modulator).max(0.0)
    }

    /// Full joint enumeration up to `max_goals` per side. This grid, not
    /// a top-k search, is the source of the "most likely scores" output.
    pub fn score_distribution(
        &self,
        lambda_home: f64,
        lambda_away: f64,
        max_goals: u32,
    ) -> Vec<ScoreProb> {
        let mut distribution = Vec::with_capacity(((max_goals + 1) * (max_goals + 1)) as usize);
        for h in 0..=max_goals {
            for a in 0..=max_goals {
                let prob = poisson_pmf(h, lambda_home) * poisson_pmf(a, lambda_away);
                distribution.push(ScoreProb {
                    home: h,
                    away: a,
                    prob,
                    cumulative: 0.0,
                });
            }
        }

        distribution.sort_by(|a, b| b.prob.total_cmp(&a.prob));
        let mut cumulative = 0.0;
        for cell in &mut distribution {
            cumulative += cell.prob;
            cell.cumulative = cumulative;
        }
        distribution
    }

    pub fn extra_markets(&self, lambda_home: f64, lambda_away: f64) -> ExtraMarkets {
        let p_h0 = poisson_pmf(0, lambda_home);
        let p_a0 = poisson_pmf(0, lambda_away);
        let btts = (1.0 - p_h0) * (1.0 - p_a0) * 100.0;

        let mut under25 = 0.0;
        for h in 0..=2u32 {
            for a in 0..=(2 - h) {
                under25 += poisson_pmf(h, lambda_home) * poisson_pmf(a, lambda_away);
            }
        }

        ExtraMarkets {
            btts,
            over25: (1.0 - under25) * 100.0,
        }
    }

    pub fn most_likely_score(&self, lambda_home: f64, lambda_away: f64) -> (u32, u32, f64) {
        let mut best = (0, 0, 0.0);
        for h in 0..=5u32 {
            for a in 0..=5u32 {
                let p = poisson_pmf(h, lambda_home) * poisson_pmf(a, lambda_away);
                if p > best.2 {
                    best = (h, a, p);
                }
            }
        }
        best
    }

    /// Normal approximation around lambda (z = 1.96, sigma = sqrt(lambda)),
    /// lower bound floored at zero goals.
    pub fn confidence_intervals(
        &self,
        lambda_home: f64,
        lambda_away: f64,
    ) -> (ConfidenceInterval, ConfidenceInterval) {
        let z = 1.96;
        let interval = |lambda: f64| {
            let std = lambda.max(0.0).sqrt();
            ConfidenceInterval {
                lower: (lambda - z * std).max(0.0),
                upper: lambda + z * std,
            }
        };
        (interval(lambda_home), interval(lambda_away))
    }

    /// Fit attack/defense strengths by iterative proportional fitting:
    /// each pass rescales a team's attack strength by the ratio of
    /// observed to expected goals scored (defense by goals conceded),
    /// then mean-normalizes both maps. All of a pass's expected totals
    /// and ratios come from the iteration-start strengths; updates land
    /// in fresh maps, so the attack fit cannot absorb the goal signal
    /// before the defense fit sees it. Stops when the largest parameter
    /// delta drops under the convergence threshold or the iteration cap
    /// is hit.
    pub fn train(&mut self, history: &[MatchRecord]) {
        if history.is_empty() {
            return;
        }

        let mut teams: Vec<&str> = Vec::new();
        for m in history {
            if !teams.contains(&m.home.as_str()) {
                teams.push(&m.home);
            }
            if !teams.contains(&m.away.as_str()) {
                teams.push(&m.away);
            }
        }

        let mut attack: HashMap<String, f64> =
            teams.iter().map(|t| (t.to_string(), 1.0)).collect();
        let mut defense: HashMap<String, f64> =
            teams.iter().map(|t| (t.to_string(), 1.0)).collect();

        for _ in 0..TRAIN_MAX_ITERATIONS {
            let mut max_delta = 0.0_f64;
            let mut next_attack = attack.clone();
            let mut next_defense = defense.clone();

            for team in &teams {
                let mut scored = 0.0;
                let mut conceded = 0.0;
                let mut expected_scored = 0.0;
                let mut expected_conceded = 0.0;

                for m in history {
                    if m.home == *team {
                        scored += m.home_goals as f64;
                        conceded += m.away_goals as f64;
                        expected_scored += self.league_average_goals * attack[*team]
                            / defense[m.away.as_str()]
                            * self.home_advantage;
                        expected_conceded +=
                            self.league_average_goals * attack[m.away.as_str()] / defense[*team];
                    } else if m.away == *team {
                        scored += m.away_goals as f64;
                        conceded += m.home_goals as f64;
                        expected_scored +=
                            self.league_average_goals * attack[*team] / defense[m.home.as_str()];
                        expected_conceded += self.league_average_goals * attack[m.home.as_str()]
                            / defense[*team]
                            * self.home_advantage;
                    }
                }

                if expected_scored > 0.0 {
                    let next = (attack[*team] * scored / expected_scored).max(0.1);
                    max_delta = max_delta.max((next - attack[*team]).abs());
                    next_attack.insert(team.to_string(), next);
                }
                // Goals conceded scale with 1/defense, so a side conceding
                // more than expected has its defense value shrunk. Observed
                // conceded is floored so a run of clean sheets still earns
                // defense credit instead of skipping the update.
                if expected_conceded > 0.0 {
                    let next = (defense[*team] * expected_conceded
                        / conceded.max(CONCEDED_FLOOR))
                    .max(0.1);
                    max_delta = max_delta.max((next - defense[*team]).abs());
                    next_defense.insert(team.to_string(), next);
                }
            }

            attack = next_attack;
            defense = next_defense;
            normalize_mean(&mut attack);
            normalize_mean(&mut defense);

            if max_delta < TRAIN_CONVERGENCE {
                break;
            }
        }

        self.attack_strength = attack;
        self.defense_strength = defense;
    }

    pub fn attack_strength(&self, team: &str) -> Option<f64> {
        self.attack_strength.get(team).copied()
    }

    pub fn defense_strength(&self, team: &str) -> Option<f64> {
        self.defense_strength.get(team).copied()
    }
}

fn normalize_mean(map: &mut HashMap<String, f64>) {
    let n = map.len();
    if n == 0 {
        return;
    }
    let mean: f64 = map.values().sum::<f64>() / n as f64;
    if mean > 0.0 {
        for v in map.values_mut() {
            *v /= mean;
        }
    }
}

fn power_fallback(power: f64) -> f64 {
    if power > 0.0 { power / 100.0 } else { 1.0 }
}

fn weather_modifier(weather: Weather) -> f64 {
    match weather {
        Weather::Rain => 0.92,
        Weather::Extreme => 0.85,
        Weather::Clear | Weather::Windy => 1.0,
    }
}

pub fn poisson_pmf(k: u32, lambda: f64) -> f64 {
    let lambda = lambda.max(0.0);
    let numer = lambda.powi(k as i32) * (-lambda).exp();
    let denom = (1..=k).fold(1.0_f64, |acc, i| acc * i as f64).max(1.0);
    numer / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CompositeIndices, PerformanceForecast, Trend};

    fn stub_profile(name: &str, attack: f64, defense: f64) -> TeamProfile {
        TeamProfile {
            name: name.to_string(),
            indices: CompositeIndices {
                offensive_power: attack,
                defensive_solidity: defense,
                home_advantage: 1.12,
                momentum: 0.1,
                fatigue: 10.0,
                motivation: 85.0,
            },
            attack_power: attack,
            midfield_power: 78.0,
            defense_power: defense,
            performance_series: vec![75.0; 12],
            forecast: PerformanceForecast {
                smoothed: attack,
                trend: Trend::Stable,
                seasonality: 1.02,
                forecast: attack,
            },
        }
    }

    #[test]
    fn home_side_gets_the_advantage_multiplier() {
        let model = PoissonModel::default();
        let a = stub_profile("A", 80.0, 75.0);
        let b = stub_profile("B", 80.0, 75.0);
        let ctx = SimulationContext::default();
        let home = model.lambda(&a, &b, true, &ctx);
        let away = model.lambda(&a, &b, false, &ctx);
        assert!(home > away);
        assert!((home / away - model.home_advantage).abs() < 1e-9);
    }

    #[test]
    fn extreme_weather_lowers_lambda_for_both_sides() {
        let model = PoissonModel::default();
        let a = stub_profile("A", 82.0, 74.0);
        let b = stub_profile("B", 76.0, 79.0);
        let clear = SimulationContext::default();
        let extreme = SimulationContext {
            weather: Weather::Extreme,
            ..clear.clone()
        };
        assert!(model.lambda(&a, &b, true, &extreme) < model.lambda(&a, &b, true, &clear));
        assert!(model.lambda(&b, &a, false, &extreme) < model.lambda(&b, &a, false, &clear));
    }

    #[test]
    fn score_distribution_mass_matches_truncated_marginals() {
        let model = PoissonModel::default();
        let (lh, la) = (1.6, 1.1);
        let dist = model.score_distribution(lh, la, 6);
        let total: f64 = dist.iter().map(|c| c.prob).sum();
        let marginal = |lambda: f64| (0..=6).map(|k| poisson_pmf(k, lambda)).sum::<f64>();
        assert!((total - marginal(lh) * marginal(la)).abs() < 1e-6);
        // Sorted descending with a running cumulative.
        for pair in dist.windows(2) {
            assert!(pair[0].prob >= pair[1].prob);
            assert!(pair[1].cumulative >= pair[0].cumulative);
        }
        assert!((dist.last().unwrap().cumulative - total).abs() < 1e-9);
    }

    #[test]
    fn extra_markets_are_consistent_percentages() {
        let model = PoissonModel::default();
        let markets = model.extra_markets(1.5, 1.2);
        assert!(markets.btts > 0.0 && markets.btts < 100.0);
        assert!(markets.over25 > 0.0 && markets.over25 < 100.0);
    }

    #[test]
    fn most_likely_score_is_the_grid_argmax() {
        let model = PoissonModel::default();
        let (h, a, p) = model.most_likely_score(1.6, 1.1);
        assert!((poisson_pmf(h, 1.6) * poisson_pmf(a, 1.1) - p).abs() < 1e-12);
        for hh in 0..=5u32 {
            for aa in 0..=5u32 {
                assert!(poisson_pmf(hh, 1.6) * poisson_pmf(aa, 1.1) <= p + 1e-12);
            }
        }
    }

    #[test]
    fn confidence_interval_lower_bound_is_floored() {
        let model = PoissonModel::default();
        let (home, _) = model.confidence_intervals(0.4, 1.0);
        assert_eq!(home.lower, 0.0);
        assert!(home.upper > 0.4);
    }

    #[test]
    fn training_learns_that_the_stronger_team_attacks_more() {
        let mut model = PoissonModel::default();
        let mut history = Vec::new();
        // A beats B repeatedly both home and away.
        for _ in 0..20 {
            history.push(MatchRecord {
                home: "A".into(),
                away: "B".into(),
                home_goals: 3,
                away_goals: 0,
            });
            history.push(MatchRecord {
                home: "B".into(),
                away: "A".into(),
                home_goals: 0,
                away_goals: 2,
            });
        }
        model.train(&history);
        let atk_a = model.attack_strength("A").unwrap();
        let atk_b = model.attack_strength("B").unwrap();
        assert!(atk_a > atk_b);
        // A concedes nothing, so its defense value sits above B's, and
        // above the league mean of 1 (the maps are mean-normalized).
        let def_a = model.defense_strength("A").unwrap();
        let def_b = model.defense_strength("B").unwrap();
        assert!(def_a > def_b);
        assert!(def_a > 1.0);
        assert!(def_b < 1.0);
    }

    #[test]
    fn training_on_empty_history_keeps_fallback_strengths() {
        let mut model = PoissonModel::default();
        model.train(&[]);
        assert!(model.attack_strength("A").is_none());
        let a = stub_profile("A", 80.0, 75.0);
        let b = stub_profile("B", 70.0, 70.0);
        let lambda = model.lambda(&a, &b, true, &SimulationContext::default());
        assert!(lambda > 0.0);
    }
}
