use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::poisson::PoissonModel;
use crate::types::{
    ConfidenceInterval, ExpectedGoals, OutcomeIntervals, RiskMetrics, SimulationContext,
    TeamProfile,
};

pub const DEFAULT_TRIALS: usize = 100_000;

const SHARD_SIZE: usize = 4_096;
/// One trial in every hundred is retained for the bootstrap pool.
const SCENARIO_STRIDE: usize = 100;

const BOOTSTRAP_RESAMPLES: usize = 1_000;
const BOOTSTRAP_DRAW: usize = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Scenario {
    pub goals_home: u32,
    pub goals_away: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub win: f64,
    pub draw: f64,
    pub loss: f64,
    pub expected_goals: ExpectedGoals,
    pub confidence_intervals: OutcomeIntervals,
    pub risk_metrics: RiskMetrics,
}

#[derive(Default)]
struct ShardTally {
    wins: u64,
    draws: u64,
    losses: u64,
    goals_home: u64,
    goals_away: u64,
    scenarios: Vec<Scenario>,
}

impl ShardTally {
    fn merge(mut self, other: ShardTally) -> ShardTally {
        self.wins += other.wins;
        self.draws += other.draws;
        self.losses += other.losses;
        self.goals_home += other.goals_home;
        self.goals_away += other.goals_away;
        self.scenarios.extend(other.scenarios);
        self
    }
}

/// Draws `trials` independent Poisson score samples under per-trial
/// contextual noise and aggregates outcome frequencies.
///
/// Trials are sharded across rayon workers. The master RNG pre-draws
/// one seed per shard before the parallel section, so the result is
/// deterministic for a given seed no matter how shards are scheduled.
/// The shared context is never mutated; each trial perturbs its own
/// copy.
pub fn simulate_match(
    home: &TeamProfile,
    away: &TeamProfile,
    model: &PoissonModel,
    ctx: &SimulationContext,
    trials: usize,
    rng: &mut StdRng,
) -> SimulationOutcome {
    let trials = trials.max(1);
    let shard_count = trials.div_ceil(SHARD_SIZE);
    let shard_seeds: Vec<u64> = (0..shard_count).map(|_| rng.gen_range(0..u64::MAX)).collect();

    // Collected in shard order, then merged sequentially: the scenario
    // pool's ordering must not depend on worker scheduling.
    let shards: Vec<ShardTally> = shard_seeds
        .into_par_iter()
        .enumerate()
        .map(|(shard, seed)| {
            let start = shard * SHARD_SIZE;
            let len = SHARD_SIZE.min(trials - start);
            run_shard(home, away, model, ctx, start, len, seed)
        })
        .collect();
    let tally = shards.into_iter().fold(ShardTally::default(), ShardTally::merge);

    let n = trials as f64;
    let win = tally.wins as f64 / n * 100.0;
    let draw = tally.draws as f64 / n * 100.0;
    let loss = tally.losses as f64 / n * 100.0;

    let confidence_intervals = bootstrap_confidence(&tally.scenarios, rng);

    SimulationOutcome {
        win,
        draw,
        loss,
        expected_goals: ExpectedGoals {
            home: tally.goals_home as f64 / n,
            away: tally.goals_away as f64 / n,
        },
        confidence_intervals,
        risk_metrics: RiskMetrics {
            volatility: (win * (100.0 - win)).max(0.0).sqrt() / 10.0,
            unexpected_factor: (tally.goals_home as f64 - tally.goals_away as f64).abs() / n,
        },
    }
}

fn run_shard(
    home: &TeamProfile,
    away: &TeamProfile,
    model: &PoissonModel,
    ctx: &SimulationContext,
    start: usize,
    len: usize,
    seed: u64,
) -> ShardTally {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tally = ShardTally::default();

    for offset in 0..len {
        let varied = perturb_context(ctx, &mut rng);
        let lambda_home = model.lambda(home, away, true, &varied);
        let lambda_away = model.lambda(away, home, false, &varied);

        let goals_home = sample_poisson(lambda_home, &mut rng);
        let goals_away = sample_poisson(lambda_away, &mut rng);

        if goals_home > goals_away {
            tally.wins += 1;
        } else if goals_home < goals_away {
            tally.losses += 1;
        } else {
            tally.draws += 1;
        }
        tally.goals_home += goals_home as u64;
        tally.goals_away += goals_away as u64;

        if (start + offset) % SCENARIO_STRIDE == 0 {
            tally.scenarios.push(Scenario {
                goals_home,
                goals_away,
            });
        }
    }
    tally
}

/// Gaussian multiplicative noise on the contextual knobs: +-5% home
/// advantage, +-10% fatigue, +-5% motivation (one sigma).
fn perturb_context(ctx: &SimulationContext, rng: &mut impl Rng) -> SimulationContext {
    SimulationContext {
        weather: ctx.weather,
        home_advantage: ctx.home_advantage * (1.0 + 0.05 * randn(rng)),
        fatigue: ctx.fatigue * (1.0 + 0.10 * randn(rng)),
        motivation: ctx.motivation * (1.0 + 0.05 * randn(rng)),
        importance: ctx.importance,
    }
}

/// Box-Muller standard normal.
fn randn(rng: &mut impl Rng) -> f64 {
    let mut u: f64 = 0.0;
    let mut v: f64 = 0.0;
    while u == 0.0 {
        u = rng.gen_range(0.0..1.0);
    }
    while v == 0.0 {
        v = rng.gen_range(0.0..1.0);
    }
    (-2.0 * u.ln()).sqrt() * (2.0 * std::f64::consts::PI * v).cos()
}

/// Knuth's product-of-uniforms Poisson sampler.
pub fn sample_poisson(lambda: f64, rng: &mut impl Rng) -> u32 {
    let limit = (-lambda.max(0.0)).exp();
    let mut k = 0u32;
    let mut p = 1.0;
    loop {
        k += 1;
        p *= rng.gen_range(0.0..1.0);
        if p <= limit {
            break;
        }
    }
    k - 1
}

/// Percentile bootstrap over the retained scenario pool: 1000 resamples
/// of 100 scenarios with replacement, per-outcome counts sorted, the
/// 2.5th/97.5th percentile entries reported as the 95% interval. An
/// empty pool yields zero-width intervals at zero.
pub fn bootstrap_confidence(scenarios: &[Scenario], rng: &mut impl Rng) -> OutcomeIntervals {
    if scenarios.is_empty() {
        let zero = ConfidenceInterval {
            lower: 0.0,
            upper: 0.0,
        };
        return OutcomeIntervals {
            win: zero,
            draw: zero,
            loss: zero,
        };
    }

    let mut boot_win = Vec::with_capacity(BOOTSTRAP_RESAMPLES);
    let mut boot_draw = Vec::with_capacity(BOOTSTRAP_RESAMPLES);
    let mut boot_loss = Vec::with_capacity(BOOTSTRAP_RESAMPLES);

    for _ in 0..BOOTSTRAP_RESAMPLES {
        let mut w = 0u32;
        let mut d = 0u32;
        let mut l = 0u32;
        for _ in 0..BOOTSTRAP_DRAW {
            let sc = scenarios[rng.gen_range(0..scenarios.len())];
            if sc.goals_home > sc.goals_away {
                w += 1;
            } else if sc.goals_home < sc.goals_away {
                l += 1;
            } else {
                d += 1;
            }
        }
        boot_win.push(w);
        boot_draw.push(d);
        boot_loss.push(l);
    }

    boot_win.sort_unstable();
    boot_draw.sort_unstable();
    boot_loss.sort_unstable();

    let interval = |sorted: &[u32]| ConfidenceInterval {
        lower: sorted[25] as f64,
        upper: sorted[975] as f64,
    };
    OutcomeIntervals {
        win: interval(&boot_win),
        draw: interval(&boot_draw),
        loss: interval(&boot_loss),
    }
}
