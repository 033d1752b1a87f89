//! Least-squares linear trend over day index.

use serde::{Deserialize, Serialize};

/// `value ≈ slope * day_index + intercept`, with goodness of fit.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendFit {
    /// Units/day change per day.
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination in `[0, 1]`. A flat series fits perfectly (`1.0`).
    pub r_squared: f64,
}

impl TrendFit {
    pub fn predict(&self, day_index: f64) -> f64 {
        self.slope * day_index + self.intercept
    }
}

/// Ordinary least squares of `values[i]` against `i` for `i in 0..n`.
///
/// Fewer than two points yield the all-zero fit.
pub fn linear_trend(values: &[f64]) -> TrendFit {
    let n = values.len();
    if n < 2 {
        return TrendFit::default();
    }

    let nf = n as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    // Distinct integer x-values: n·Σx² − (Σx)² = n²(n²−1)/12 > 0 for n >= 2.
    let denominator = nf * sum_xx - sum_x * sum_x;
    debug_assert!(denominator > 0.0, "degenerate regression denominator for n={n}");
    if denominator <= 0.0 {
        return TrendFit::default();
    }

    let slope = (nf * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / nf;

    let mean = sum_y / nf;
    let (mut ss_res, mut ss_tot) = (0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let residual = y - (slope * i as f64 + intercept);
        ss_res += residual * residual;
        ss_tot += (y - mean) * (y - mean);
    }

    let r_squared = if ss_tot == 0.0 {
        1.0
    } else {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    };

    TrendFit {
        slope,
        intercept,
        r_squared,
    }
}
