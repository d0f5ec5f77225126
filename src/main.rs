use anyhow::{Result, bail};
use chrono::Local;

use matchcast::engine;
use matchcast::monte_carlo::DEFAULT_TRIALS;
use matchcast::types::{SimulationContext, Weather};

struct CliArgs {
    home: String,
    away: String,
    weather: Weather,
    importance: f64,
    home_advantage: f64,
    trials: usize,
    json: bool,
}

fn parse_args() -> Result<CliArgs> {
    let mut positional: Vec<String> = Vec::new();
    let mut weather = Weather::Clear;
    let mut importance = 0.7_f64;
    let mut home_advantage = 1.15_f64;
    let mut json = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--weather" => {
                let raw = args.next().unwrap_or_default();
                weather = match Weather::parse(&raw) {
                    Some(w) => w,
                    None => bail!("unknown weather '{raw}' (clear|rain|windy|extreme)"),
                };
            }
            "--importance" => {
                let raw = args.next().unwrap_or_default();
                importance = raw.parse::<f64>().unwrap_or(0.7).clamp(0.0, 1.0);
            }
            "--home-advantage" => {
                let raw = args.next().unwrap_or_default();
                home_advantage = raw.parse::<f64>().unwrap_or(1.15).clamp(0.8, 1.5);
            }
            "--json" => json = true,
            other => positional.push(other.to_string()),
        }
    }

    if positional.len() != 2 {
        bail!("usage: matchcast <home> <away> [--weather W] [--importance I] [--home-advantage H] [--json]");
    }

    let trials = std::env::var("MATCHCAST_TRIALS")
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(DEFAULT_TRIALS)
        .max(1_000);

    Ok(CliArgs {
        home: positional.remove(0),
        away: positional.remove(0),
        weather,
        importance,
        home_advantage,
        trials,
        json,
    })
}

fn main() -> Result<()> {
    let args = parse_args()?;

    let ctx = SimulationContext {
        weather: args.weather,
        importance: args.importance,
        home_advantage: args.home_advantage,
        ..SimulationContext::default()
    };

    let result = engine::analyze_match(&args.home, &args.away, Some(ctx), args.trials);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "matchcast report | {} | {} vs {}",
        Local::now().format("%Y-%m-%d %H:%M"),
        args.home,
        args.away
    );
    println!();
    println!("Home win: {:.2}%", result.win_prob);
    println!("Draw:     {:.2}%", result.draw_prob);
    println!("Away win: {:.2}%", result.loss_prob);
    println!();
    println!(
        "Expected goals: {:.2} - {:.2}",
        result.expected_goals.home, result.expected_goals.away
    );
    println!("Most likely score: {}", result.exact_score);
    println!("Top scores:");
    for entry in &result.top_scores {
        println!("  {:>5}  {:.2}%", entry.score, entry.probability);
    }

    if result.value_bets.is_empty() {
        println!("No value bets above the edge threshold.");
    } else {
        println!("Value bets:");
        for bet in &result.value_bets {
            println!(
                "  {:<9} fair {:.2} market {:.2} edge {:.2}%",
                bet.market, bet.fair_odds, bet.market_odds, bet.edge
            );
        }
    }

    println!();
    println!(
        "Confidence index: {:.1} | volatility {:.2} | GARCH VaR95 {:.2}",
        result.confidence_index,
        result.risk_metrics.volatility,
        result.time_series.home.volatility.var95
    );
    println!(
        "Ensemble weights: poisson {:.2} / monte-carlo {:.2} / bayesian {:.2}",
        result.ensemble_metrics.poisson_weight,
        result.ensemble_metrics.monte_carlo_weight,
        result.ensemble_metrics.bayesian_weight
    );

    Ok(())
}
