//! Human-readable rendering of a forecast, as shown on the inventory dashboard.

use serde::{Deserialize, Serialize};

use crate::insights::TrendStrength;
use crate::result::ForecastResult;

pub const METHOD_LABEL: &str =
    "Statistical (Moving Average + Exponential Smoothing + Trend Analysis)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmFigures {
    pub moving_average_short: String,
    pub moving_average_long: String,
    pub exponential_smoothing: String,
    pub trend_slope: String,
    pub seasonal_factor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub item: String,
    pub current_stock: u64,
    pub method: String,
    pub daily_usage_rate: String,
    pub depletion: String,
    pub recommended_reorder: String,
    pub confidence: String,
    pub patterns: String,
    pub confidence_interval: String,
    pub seasonality: String,
    pub trend_strength: String,
    pub algorithms: AlgorithmFigures,
}

impl ForecastResult {
    /// Render for display. `trend_threshold` decides `Strong`/`Weak` trend wording.
    pub fn report(&self, trend_threshold: f64) -> ForecastReport {
        let depletion = match (self.depletion.days_until_depletion, self.depletion.depletion_date) {
            (Some(days), Some(date)) => format!("{} ({days} days)", date.format("%Y-%m-%d")),
            (Some(days), None) => format!("in {days} days"),
            (None, _) => "Stock sufficient for forecast period".to_string(),
        };

        let patterns = if self.insights.is_empty() {
            "Stable usage pattern".to_string()
        } else {
            self.insight_messages().join(", ")
        };

        let seasonal = self.seasonality.is_seasonal;

        ForecastReport {
            item: self.item_name.clone(),
            current_stock: self.current_stock,
            method: METHOD_LABEL.to_string(),
            daily_usage_rate: format!("{:.2} units/day", self.daily_usage_rate),
            depletion,
            recommended_reorder: format!("{} units", self.reorder.quantity),
            confidence: format!("{} (R² = {:.3})", self.confidence_level, self.trend.r_squared),
            patterns,
            confidence_interval: format!(
                "{:.1} - {:.1} units/day",
                self.confidence_band.lower, self.confidence_band.upper
            ),
            seasonality: if seasonal { "Weekly pattern detected" } else { "No clear seasonal pattern" }
                .to_string(),
            trend_strength: TrendStrength::from_slope(self.trend.slope, trend_threshold).to_string(),
            algorithms: AlgorithmFigures {
                moving_average_short: format!("{:.2}", self.short_moving_average),
                moving_average_long: format!("{:.2}", self.long_moving_average),
                exponential_smoothing: format!("{:.2}", self.smoothed_level),
                trend_slope: format!("{:.4}", self.trend.slope),
                seasonal_factor: if seasonal { "Applied" } else { "None" }.to_string(),
            },
        }
    }
}
