//! Level estimators over a daily series.

/// Mean of the last `min(window, len)` values. `0.0` for an empty series or zero window.
pub fn moving_average(values: &[f64], window: usize) -> f64 {
    let take = window.min(values.len());
    if take == 0 {
        return 0.0;
    }
    let tail = &values[values.len() - take..];
    tail.iter().sum::<f64>() / (take as f64)
}

/// Simple exponential smoothing; returns the final level.
///
/// Seeded with the first value, then `level += alpha * (v - level)` for each
/// following value (equivalent to `alpha * v + (1 - alpha) * level`, but keeps
/// a constant series exactly constant). `0.0` for an empty series.
pub fn exponential_smoothing(values: &[f64], alpha: f64) -> f64 {
    let Some((first, rest)) = values.split_first() else {
        return 0.0;
    };
    rest.iter().fold(*first, |level, v| level + alpha * (v - level))
}
