//! Back-tested confidence band for the daily rate.
//!
//! Replays a naive predictor (smoothed level plus trend) over the most recent
//! days, measures absolute errors against what actually happened, and widens
//! the last prediction by `z` standard deviations of those errors. Assumes
//! roughly normal errors; for sparse or bursty usage the band is coarse.

use serde::{Deserialize, Serialize};

use crate::trend::TrendFit;

#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    /// Never negative.
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceBand {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Naive predictions for the last `min(window, series_len)` days.
///
/// Prediction `i` is `max(0, level + slope * (series_len + i))`: the trend is
/// extrapolated from the start of the series, not from the window.
pub fn backtest_predictions(series_len: usize, window: usize, level: f64, trend: &TrendFit) -> Vec<f64> {
    let days = window.min(series_len);
    (0..days)
        .map(|i| (level + trend.slope * (series_len + i) as f64).max(0.0))
        .collect()
}

/// Absolute error of each prediction against the matching actual.
pub fn backtest_errors(actuals: &[f64], predictions: &[f64]) -> Vec<f64> {
    actuals
        .iter()
        .zip(predictions)
        .map(|(actual, predicted)| (actual - predicted).abs())
        .collect()
}

/// `[max(0, last − z·σ), last + z·σ]` where `σ` is the population standard
/// deviation of `errors` and `last` the final prediction.
///
/// No errors to learn from yields `{0, 0}`.
pub fn confidence_band(predictions: &[f64], errors: &[f64], z: f64) -> ConfidenceBand {
    if errors.is_empty() {
        return ConfidenceBand::default();
    }

    let n = errors.len() as f64;
    let mean = errors.iter().sum::<f64>() / n;
    let variance = errors.iter().map(|e| (e - mean) * (e - mean)).sum::<f64>() / n;
    let margin = z * variance.sqrt();
    let last = predictions.last().copied().unwrap_or(0.0);

    ConfidenceBand {
        lower: (last - margin).max(0.0),
        upper: last + margin,
    }
}

/// Full back-test over the tail of `values`.
pub fn backtest(values: &[f64], window: usize, level: f64, trend: &TrendFit, z: f64) -> ConfidenceBand {
    let predictions = backtest_predictions(values.len(), window, level, trend);
    let actuals = &values[values.len() - predictions.len()..];
    let errors = backtest_errors(actuals, &predictions);
    confidence_band(&predictions, &errors, z)
}
