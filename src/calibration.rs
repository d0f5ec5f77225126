use crate::types::PredictionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

/// Outcome probabilities from the home side's perspective, as fractions.
#[derive(Debug, Clone, Copy)]
pub struct Prob3 {
    pub win: f64,
    pub draw: f64,
    pub loss: f64,
}

impl Prob3 {
    pub fn uniform() -> Self {
        Self {
            win: 1.0 / 3.0,
            draw: 1.0 / 3.0,
            loss: 1.0 / 3.0,
        }
    }

    pub fn from_result(result: &PredictionResult) -> Self {
        Self {
            win: result.win_prob / 100.0,
            draw: result.draw_prob / 100.0,
            loss: result.loss_prob / 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Metrics {
    pub samples: usize,
    pub brier: f64,
    pub log_loss: f64,
    pub accuracy: f64,
}

pub fn classify_outcome(home_goals: u32, away_goals: u32) -> Outcome {
    if home_goals > away_goals {
        Outcome::Win
    } else if home_goals < away_goals {
        Outcome::Loss
    } else {
        Outcome::Draw
    }
}

/// Brier score, log loss and top-class accuracy over a forecast set.
/// Mismatched or empty inputs score as an empty sample rather than
/// panicking.
pub fn evaluate_probs(predictions: &[Prob3], outcomes: &[Outcome]) -> Metrics {
    if predictions.is_empty() || predictions.len() != outcomes.len() {
        return Metrics {
            samples: 0,
            brier: 0.0,
            log_loss: 0.0,
            accuracy: 0.0,
        };
    }

    let mut brier_sum = 0.0_f64;
    let mut log_loss_sum = 0.0_f64;
    let mut correct = 0usize;

    for (p, outcome) in predictions.iter().zip(outcomes) {
        let y = one_hot(*outcome);
        brier_sum +=
            (p.win - y.win).powi(2) + (p.draw - y.draw).powi(2) + (p.loss - y.loss).powi(2);

        let actual = match outcome {
            Outcome::Win => p.win,
            Outcome::Draw => p.draw,
            Outcome::Loss => p.loss,
        }
        .clamp(1e-12, 1.0);
        log_loss_sum += -actual.ln();

        if argmax(*p) == *outcome {
            correct += 1;
        }
    }

    let n = predictions.len() as f64;
    Metrics {
        samples: predictions.len(),
        brier: brier_sum / n,
        log_loss: log_loss_sum / n,
        accuracy: correct as f64 / n,
    }
}

fn argmax(p: Prob3) -> Outcome {
    if p.win >= p.draw && p.win >= p.loss {
        Outcome::Win
    } else if p.draw >= p.loss {
        Outcome::Draw
    } else {
        Outcome::Loss
    }
}

fn one_hot(outcome: Outcome) -> Prob3 {
    match outcome {
        Outcome::Win => Prob3 {
            win: 1.0,
            draw: 0.0,
            loss: 0.0,
        },
        Outcome::Draw => Prob3 {
            win: 0.0,
            draw: 1.0,
            loss: 0.0,
        },
        Outcome::Loss => Prob3 {
            win: 0.0,
            draw: 0.0,
            loss: 1.0,
        },
    }
}
