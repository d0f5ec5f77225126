use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;

use matchcast::calibration::{self, Outcome, Prob3};
use matchcast::engine;
use matchcast::monte_carlo::sample_poisson;
use matchcast::poisson::{MatchRecord, PoissonModel};

const TEAMS: [&str; 8] = [
    "Atletico Rojo",
    "Blauwe Stad",
    "Calcio Verde",
    "Dynamo Nord",
    "Estrela Azul",
    "Fortuna Ouest",
    "Gloria Alba",
    "Hvid Kyst",
];

const ROUNDS: usize = 4;
const BACKTEST_TRIALS: usize = 20_000;

/// Offline evaluation loop: synthesize a fixture history, train the
/// Poisson model on it, then score the full ensemble against the
/// simulated outcomes. No network, meant for quick tuning iterations.
fn main() -> Result<()> {
    let seed = std::env::args()
        .nth(1)
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(2026);
    let mut rng = StdRng::seed_from_u64(seed);

    let history = synthesize_history(&mut rng);
    println!("Synthesized {} fixtures across {ROUNDS} rounds.", history.len());

    let mut model = PoissonModel::default();
    model.train(&history);

    let mut predictions = Vec::with_capacity(history.len());
    let mut outcomes = Vec::with_capacity(history.len());
    for fixture in &history {
        let result = engine::analyze_match_with(
            &model,
            &fixture.home,
            &fixture.away,
            None,
            BACKTEST_TRIALS,
        );
        predictions.push(Prob3::from_result(&result));
        outcomes.push(calibration::classify_outcome(
            fixture.home_goals,
            fixture.away_goals,
        ));
    }

    let trained = calibration::evaluate_probs(&predictions, &outcomes);
    let baseline = calibration::evaluate_probs(&vec![Prob3::uniform(); outcomes.len()], &outcomes);

    println!();
    println!("{:<12} {:>8} {:>10} {:>10}", "model", "brier", "log-loss", "accuracy");
    println!(
        "{:<12} {:>8.4} {:>10.4} {:>9.1}%",
        "ensemble",
        trained.brier,
        trained.log_loss,
        trained.accuracy * 100.0
    );
    println!(
        "{:<12} {:>8.4} {:>10.4} {:>9.1}%",
        "uniform",
        baseline.brier,
        baseline.log_loss,
        baseline.accuracy * 100.0
    );

    let wins = outcomes.iter().filter(|o| **o == Outcome::Win).count();
    let draws = outcomes.iter().filter(|o| **o == Outcome::Draw).count();
    println!();
    println!(
        "Outcome base rates: {wins} home wins / {draws} draws / {} away wins",
        outcomes.len() - wins - draws
    );

    Ok(())
}

/// Round-robin fixtures with goals drawn from per-team scoring rates
/// derived from the same name hash the engine uses, so stronger-seeded
/// names really do score more in the synthetic history.
fn synthesize_history(rng: &mut StdRng) -> Vec<MatchRecord> {
    let mut history = Vec::new();
    for _ in 0..ROUNDS {
        for (i, home) in TEAMS.iter().enumerate() {
            for (j, away) in TEAMS.iter().enumerate() {
                if i == j {
                    continue;
                }
                let lambda_home = base_rate(home) * 1.22;
                let lambda_away = base_rate(away);
                history.push(MatchRecord {
                    home: home.to_string(),
                    away: away.to_string(),
                    home_goals: sample_poisson(lambda_home, rng),
                    away_goals: sample_poisson(lambda_away, rng),
                });
            }
        }
    }
    history
}

fn base_rate(name: &str) -> f64 {
    0.9 + (engine::team_seed(name) % 10) as f64 * 0.08
}
