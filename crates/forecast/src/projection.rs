//! Depletion projection and reorder recommendation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// When stock is expected to run out. Both fields are `None` when usage is
/// zero (stock lasts indefinitely).
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Depletion {
    pub days_until_depletion: Option<u64>,
    /// `None` also when the projected date is beyond the representable calendar.
    pub depletion_date: Option<DateTime<Utc>>,
}

impl Depletion {
    pub fn never() -> Self {
        Self::default()
    }

    pub fn is_never(&self) -> bool {
        self.days_until_depletion.is_none()
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderRecommendation {
    pub quantity: u64,
    pub safety_stock: u64,
}

/// Daily rate estimate: the larger of the short moving average and the smoothed level.
pub fn effective_rate(short_moving_average: f64, smoothed_level: f64) -> f64 {
    short_moving_average.max(smoothed_level)
}

/// Flat uplift when a seasonal pattern was detected. The pattern's shape is not used.
pub fn seasonally_adjusted(rate: f64, is_seasonal: bool, uplift: f64) -> f64 {
    if is_seasonal { rate * uplift } else { rate }
}

/// `floor(stock / rate)` whole days from `now`. An infinite rate depletes today;
/// a zero, negative or NaN rate never depletes.
pub fn project_depletion(current_stock: u64, daily_rate: f64, now: DateTime<Utc>) -> Depletion {
    if daily_rate.is_nan() || daily_rate <= 0.0 {
        return Depletion::never();
    }

    let days = (current_stock as f64 / daily_rate).floor() as u64;
    let depletion_date = i64::try_from(days)
        .ok()
        .and_then(Duration::try_days)
        .and_then(|offset| now.checked_add_signed(offset));

    Depletion {
        days_until_depletion: Some(days),
        depletion_date,
    }
}

/// Cover lead time plus the forecast horizon, plus `safety_days` of buffer.
///
/// `quantity = ceil(rate · (lead_time + horizon)) + ceil(rate · safety_days)`.
pub fn recommend_reorder(
    daily_rate: f64,
    lead_time_days: u32,
    horizon_days: u32,
    safety_days: u32,
) -> ReorderRecommendation {
    let rate = if daily_rate.is_nan() { 0.0 } else { daily_rate.max(0.0) };
    let safety_stock = (rate * f64::from(safety_days)).ceil() as u64;
    let cover = (rate * (f64::from(lead_time_days) + f64::from(horizon_days))).ceil() as u64;

    ReorderRecommendation {
        quantity: cover.saturating_add(safety_stock),
        safety_stock,
    }
}
