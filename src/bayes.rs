use once_cell::sync::Lazy;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::{SimulationContext, Weather};

/// Discrete network over qualitative match factors:
///
/// ```text
/// teamForm ----------\
/// matchImportance ----+--> scoreProbability
/// tacticalMatchup ---/
/// ```
///
/// The three upstream factors get their distributions from context
/// evidence lookups; the child owns a full 4x3x3 conditional table.
/// Table values are heuristic priors, not fitted from data, but the
/// inference over them is genuine marginalization.

pub const FORM_STATES: [&str; 4] = ["excellent", "good", "average", "poor"];
pub const IMPORTANCE_STATES: [&str; 3] = ["high", "medium", "low"];
pub const MATCHUP_STATES: [&str; 3] = ["favorable", "neutral", "unfavorable"];
pub const TEMPO_STATES: [&str; 3] = ["highScore", "mediumScore", "lowScore"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreTempo {
    High,
    Medium,
    Low,
}

impl ScoreTempo {
    pub fn label(self) -> &'static str {
        TEMPO_STATES[self as usize]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TempoDistribution {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl TempoDistribution {
    fn from_array(p: [f64; 3]) -> Self {
        Self {
            high: p[0],
            medium: p[1],
            low: p[2],
        }
    }

    pub fn argmax(&self) -> ScoreTempo {
        if self.high >= self.medium && self.high >= self.low {
            ScoreTempo::High
        } else if self.medium >= self.low {
            ScoreTempo::Medium
        } else {
            ScoreTempo::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inference {
    pub probabilities: TempoDistribution,
    pub most_likely_state: ScoreTempo,
    /// Shannon entropy of the tempo distribution, in bits.
    pub entropy: f64,
    /// 1 - entropy / log2(3), clamped to [0, 1].
    pub confidence: f64,
    /// Marginal over the tactical-matchup factor, for reporting.
    pub matchup: [f64; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSample {
    pub team_form: &'static str,
    pub match_importance: &'static str,
    pub tactical_matchup: &'static str,
    pub score_probability: &'static str,
}

/// P(scoreProbability | form, importance, matchup), flattened as
/// form * 9 + importance * 3 + matchup. Built once; rows derive from an
/// additive attacking-tilt score so the table stays monotone in each
/// parent (better form and matchup push toward high tempo, high stakes
/// push toward cagey football).
static SCORE_CPT: Lazy<Vec<[f64; 3]>> = Lazy::new(|| {
    const FORM_TILT: [f64; 4] = [0.30, 0.15, 0.0, -0.15];
    const IMPORTANCE_TILT: [f64; 3] = [-0.10, 0.0, 0.05];
    const MATCHUP_TILT: [f64; 3] = [0.15, 0.0, -0.15];

    let mut table = Vec::with_capacity(4 * 3 * 3);
    for f in 0..4 {
        for i in 0..3 {
            for m in 0..3 {
                let tilt = FORM_TILT[f] + IMPORTANCE_TILT[i] + MATCHUP_TILT[m];
                let high = (1.0 / 3.0 + tilt).clamp(0.05, 0.85);
                let low = (1.0 / 3.0 - tilt).clamp(0.05, 0.85);
                let medium = (1.0 - high - low).max(0.05);
                let sum = high + medium + low;
                table.push([high / sum, medium / sum, low / sum]);
            }
        }
    }
    table
});

fn cpt_row(form: usize, importance: usize, matchup: usize) -> [f64; 3] {
    SCORE_CPT[form * 9 + importance * 3 + matchup]
}

/// Evidence lookup for the team-form factor. Motivation and fatigue are
/// the observable proxies the context carries.
fn form_distribution(ctx: &SimulationContext) -> [f64; 4] {
    if ctx.motivation >= 90.0 && ctx.fatigue <= 12.0 {
        [0.35, 0.40, 0.20, 0.05]
    } else if ctx.fatigue >= 20.0 {
        [0.05, 0.20, 0.40, 0.35]
    } else {
        [0.15, 0.35, 0.35, 0.15]
    }
}

fn importance_distribution(ctx: &SimulationContext) -> [f64; 3] {
    if ctx.importance > 0.8 {
        // Hard evidence, matching the enrichment layer's signal.
        [1.0, 0.0, 0.0]
    } else if ctx.importance >= 0.5 {
        [0.30, 0.50, 0.20]
    } else {
        [0.10, 0.40, 0.50]
    }
}

fn matchup_distribution(ctx: &SimulationContext) -> [f64; 3] {
    let base = if ctx.home_advantage > 1.2 {
        [0.45, 0.40, 0.15]
    } else if ctx.home_advantage < 1.0 {
        [0.20, 0.40, 0.40]
    } else {
        [0.30, 0.45, 0.25]
    };
    if ctx.weather == Weather::Extreme {
        // Conditions level the pitch: pull mass toward neutral.
        let favorable = base[0] * 0.7;
        let unfavorable = base[2];
        [favorable, 1.0 - favorable - unfavorable, unfavorable]
    } else {
        base
    }
}

/// Exact marginalization of the score-tempo node over the three
/// upstream factors.
pub fn infer(ctx: &SimulationContext) -> Inference {
    let p_form = form_distribution(ctx);
    let p_importance = importance_distribution(ctx);
    let p_matchup = matchup_distribution(ctx);

    let mut tempo = [0.0_f64; 3];
    for (f, pf) in p_form.iter().enumerate() {
        for (i, pi) in p_importance.iter().enumerate() {
            for (m, pm) in p_matchup.iter().enumerate() {
                let weight = pf * pi * pm;
                if weight == 0.0 {
                    continue;
                }
                let row = cpt_row(f, i, m);
                for (t, p) in row.iter().enumerate() {
                    tempo[t] += weight * p;
                }
            }
        }
    }

    let sum: f64 = tempo.iter().sum();
    for p in &mut tempo {
        *p /= sum.max(1e-12);
    }

    let entropy = -tempo
        .iter()
        .filter(|p| **p > 0.0)
        .map(|p| p * p.log2())
        .sum::<f64>();
    let confidence = (1.0 - entropy / 3.0_f64.log2()).clamp(0.0, 1.0);

    let probabilities = TempoDistribution::from_array(tempo);
    Inference {
        most_likely_state: probabilities.argmax(),
        probabilities,
        entropy,
        confidence,
        matchup: p_matchup,
    }
}

/// Ancestral sampling over the network: parents first, then the child
/// from its conditional row. Exact for this tree-shaped graph.
pub fn sample_states(ctx: &SimulationContext, n: usize, rng: &mut impl Rng) -> Vec<NetworkSample> {
    let p_form = form_distribution(ctx);
    let p_importance = importance_distribution(ctx);
    let p_matchup = matchup_distribution(ctx);

    (0..n)
        .map(|_| {
            let f = sample_categorical(&p_form, rng);
            let i = sample_categorical(&p_importance, rng);
            let m = sample_categorical(&p_matchup, rng);
            let t = sample_categorical(&cpt_row(f, i, m), rng);
            NetworkSample {
                team_form: FORM_STATES[f],
                match_importance: IMPORTANCE_STATES[i],
                tactical_matchup: MATCHUP_STATES[m],
                score_probability: TEMPO_STATES[t],
            }
        })
        .collect()
}

fn sample_categorical(weights: &[f64], rng: &mut impl Rng) -> usize {
    let mut roll = rng.gen_range(0.0..1.0);
    for (i, w) in weights.iter().enumerate() {
        if roll < *w {
            return i;
        }
        roll -= w;
    }
    weights.len() - 1
}
