use rand::Rng;

use crate::types::{Decomposition, ForecastBand, TimeSeriesAnalytics, VolatilityFit};

// GARCH(1,1) parameters, held fixed rather than fitted.
const GARCH_OMEGA: f64 = 0.05;
const GARCH_ALPHA: f64 = 0.15;
const GARCH_BETA: f64 = 0.8;

const VAR95_Z: f64 = 1.645;
const EXPECTED_SHORTFALL_Z: f64 = 2.06;

/// Trend/seasonal/residual split of a performance series. The trend is a
/// centered moving average clamped at the series boundaries (the
/// available sub-window is used instead of padding), so
/// trend + seasonal + residual reconstructs the input exactly.
pub fn decompose(series: &[f64], period: usize) -> Decomposition {
    let n = series.len();
    let period = period.max(1);
    let half = period / 2;

    let trend: Vec<f64> = (0..n)
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(n);
            let window = &series[start..end];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect();

    let mut pattern = vec![0.0_f64; period];
    let mut counts = vec![0usize; period];
    for (i, (y, t)) in series.iter().zip(&trend).enumerate() {
        pattern[i % period] += y - t;
        counts[i % period] += 1;
    }
    for (sum, count) in pattern.iter_mut().zip(&counts) {
        *sum /= (*count).max(1) as f64;
    }

    let seasonal: Vec<f64> = (0..n).map(|i| pattern[i % period]).collect();
    let residual: Vec<f64> = (0..n)
        .map(|i| series[i] - trend[i] - seasonal[i])
        .collect();

    Decomposition {
        trend,
        seasonal,
        residual,
    }
}

/// Naive short-horizon forecast: linear extrapolation from the endpoint
/// slope with a small noise term, bands widening linearly with the
/// horizon step. An approximate placeholder, not a fitted ARIMA.
pub fn forecast(series: &[f64], horizon: usize, rng: &mut impl Rng) -> ForecastBand {
    if series.is_empty() {
        return ForecastBand {
            values: Vec::new(),
            upper: Vec::new(),
            lower: Vec::new(),
        };
    }

    let last = series[series.len() - 1];
    let slope = (last - series[0]) / series.len() as f64;

    let values: Vec<f64> = (0..horizon)
        .map(|i| last + slope * (i + 1) as f64 + rng.gen_range(-1.0..1.0))
        .collect();
    let upper: Vec<f64> = values
        .iter()
        .enumerate()
        .map(|(i, v)| v + (i + 1) as f64 * 1.5)
        .collect();
    let lower: Vec<f64> = values
        .iter()
        .enumerate()
        .map(|(i, v)| (v - (i + 1) as f64 * 1.5).max(0.0))
        .collect();

    ForecastBand {
        values,
        upper,
        lower,
    }
}

/// GARCH(1,1) conditional volatility over the series' simple returns,
/// seeded with their RMS. Reports VaR95 and expected shortfall scaled
/// from the final conditional sigma. Series with fewer than two points
/// carry no return information and yield a zeroed fit.
pub fn volatility(series: &[f64]) -> VolatilityFit {
    if series.len() < 2 {
        return VolatilityFit {
            conditional: vec![0.0],
            var95: 0.0,
            expected_shortfall: 0.0,
        };
    }

    let returns: Vec<f64> = series
        .windows(2)
        .map(|w| {
            let denom = if w[0] != 0.0 { w[0] } else { 1.0 };
            (w[1] - w[0]) / denom
        })
        .collect();

    let mut sigma = (returns.iter().map(|r| r * r).sum::<f64>() / returns.len() as f64).sqrt();
    let mut conditional = Vec::with_capacity(returns.len() + 1);
    conditional.push(sigma);
    for r in &returns {
        sigma = (GARCH_OMEGA + GARCH_ALPHA * r * r + GARCH_BETA * sigma * sigma).sqrt();
        conditional.push(sigma);
    }

    VolatilityFit {
        conditional,
        var95: sigma * VAR95_Z,
        expected_shortfall: sigma * EXPECTED_SHORTFALL_Z,
    }
}

pub fn analyze(series: &[f64], rng: &mut impl Rng) -> TimeSeriesAnalytics {
    TimeSeriesAnalytics {
        decomposition: decompose(series, 4),
        forecast: forecast(series, 3, rng),
        volatility: volatility(series),
    }
}
