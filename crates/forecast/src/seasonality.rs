//! Weekly pattern detection.
//!
//! Heuristic, not a significance test: the series is called seasonal when the
//! spread of the per-phase averages is a large enough share of the spread of
//! the raw values.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityResult {
    pub is_seasonal: bool,
    /// Average usage per phase of the period. `pattern[k]` averages the days
    /// at positions `k, k + period, ...` from the start of the series, so with
    /// a weekly period each slot is one weekday. Empty when there was too
    /// little data to test.
    pub pattern: Vec<f64>,
}

/// Test `values` for a recurring pattern of length `period`.
///
/// Needs at least two full periods; otherwise reports not seasonal with an
/// empty pattern. Seasonal when
/// `var(phase averages) > variance_ratio * var(values)` (population variances
/// around the overall mean).
pub fn detect_seasonality(values: &[f64], period: usize, variance_ratio: f64) -> SeasonalityResult {
    if period == 0 || values.len() < period * 2 {
        return SeasonalityResult::default();
    }

    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, v) in values.iter().enumerate() {
        sums[i % period] += v;
        counts[i % period] += 1;
    }

    let pattern: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(sum, count)| if *count > 0 { sum / *count as f64 } else { 0.0 })
        .collect();

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let seasonal_variance = variance_around(&pattern, mean);
    let total_variance = variance_around(values, mean);

    SeasonalityResult {
        is_seasonal: seasonal_variance > total_variance * variance_ratio,
        pattern,
    }
}

fn variance_around(xs: &[f64], mean: f64) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / xs.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: usize = 7;
    const RATIO: f64 = 0.1;

    #[test]
    fn needs_two_full_periods() {
        let values = vec![10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let result = detect_seasonality(&values, WEEK, RATIO);
        assert!(!result.is_seasonal);
        assert!(result.pattern.is_empty());
    }

    #[test]
    fn weekly_spike_is_seasonal() {
        let values: Vec<f64> = (0..60).map(|i| if i % 7 == 0 { 10.0 } else { 0.0 }).collect();
        let result = detect_seasonality(&values, WEEK, RATIO);

        assert!(result.is_seasonal);
        assert_eq!(result.pattern.len(), WEEK);
        assert_eq!(result.pattern[0], 10.0);
        assert!(result.pattern[1..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn weekly_spike_over_exactly_two_weeks() {
        let values: Vec<f64> = (0..14).map(|i| if i % 7 == 3 { 10.0 } else { 0.0 }).collect();
        assert!(detect_seasonality(&values, WEEK, RATIO).is_seasonal);
    }

    #[test]
    fn flat_series_is_not_seasonal() {
        let zeros = detect_seasonality(&[0.0; 60], WEEK, RATIO);
        assert!(!zeros.is_seasonal);
        assert_eq!(zeros.pattern, vec![0.0; WEEK]);

        assert!(!detect_seasonality(&[2.0; 60], WEEK, RATIO).is_seasonal);
    }

    #[test]
    fn alternating_days_without_weekly_phase_is_not_seasonal() {
        // Period-2 alternation spreads evenly over weekday slots across the window.
        let values: Vec<f64> = (0..56).map(|i| if i % 2 == 0 { 4.0 } else { 0.0 }).collect();
        assert!(!detect_seasonality(&values, WEEK, RATIO).is_seasonal);
    }

    #[test]
    fn threshold_is_overridable() {
        let values: Vec<f64> = (0..60).map(|i| if i % 7 == 0 { 10.0 } else { 0.0 }).collect();
        assert!(!detect_seasonality(&values, WEEK, 1.0).is_seasonal);
    }

    #[test]
    fn zero_period_is_never_seasonal() {
        assert_eq!(detect_seasonality(&[1.0, 2.0], 0, RATIO), SeasonalityResult::default());
    }
}
