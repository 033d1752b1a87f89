use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use clinic_core::AggregateId;

use crate::confidence::ConfidenceBand;
use crate::insights::{ConfidenceLevel, Insight, TrendStrength};
use crate::projection::{Depletion, ReorderRecommendation};
use crate::seasonality::SeasonalityResult;
use crate::trend::TrendFit;

/// Outcome of forecasting one item over one horizon.
///
/// Always fully populated; degenerate history produces fallback values, not
/// a partial result. Computed fresh per call and never stored by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub item_id: AggregateId,
    pub item_name: String,
    pub current_stock: u64,
    pub expiration_date: Option<DateTime<Utc>>,
    pub generated_at: DateTime<Utc>,
    pub horizon_days: u32,

    pub short_moving_average: f64,
    pub long_moving_average: f64,
    pub smoothed_level: f64,
    pub trend: TrendFit,
    pub seasonality: SeasonalityResult,
    pub confidence_band: ConfidenceBand,

    /// `max(short moving average, smoothed level)` before any seasonal uplift.
    pub base_daily_rate: f64,
    /// Rate used for depletion and reorder (seasonally adjusted).
    pub daily_usage_rate: f64,
    pub depletion: Depletion,
    pub reorder: ReorderRecommendation,

    pub confidence_level: ConfidenceLevel,
    pub insights: Vec<Insight>,
}

impl ForecastResult {
    /// `None` when usage is zero and stock lasts indefinitely.
    pub fn days_until_depletion(&self) -> Option<u64> {
        self.depletion.days_until_depletion
    }

    pub fn depletion_date(&self) -> Option<DateTime<Utc>> {
        self.depletion.depletion_date
    }

    pub fn recommended_reorder_quantity(&self) -> u64 {
        self.reorder.quantity
    }

    pub fn is_seasonal(&self) -> bool {
        self.seasonality.is_seasonal
    }

    pub fn trend_strength(&self, threshold: f64) -> TrendStrength {
        TrendStrength::from_slope(self.trend.slope, threshold)
    }

    pub fn insight_messages(&self) -> Vec<String> {
        self.insights.iter().map(ToString::to_string).collect()
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    /// The item snapshot could not be found; no forecast is produced.
    #[error("inventory item {item_id} not found")]
    ItemNotFound { item_id: AggregateId },

    /// A collaborator read failed (storage, transport).
    #[error("forecast source unavailable: {0}")]
    SourceUnavailable(String),
}

impl ForecastError {
    pub fn item_not_found(item_id: AggregateId) -> Self {
        Self::ItemNotFound { item_id }
    }

    pub fn source(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }
}
