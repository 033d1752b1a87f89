//! `clinic-forecast`
//!
//! **Responsibility:** inventory usage forecasting for clinic supplies.
//!
//! Given an item snapshot and its consumption history, estimate daily demand,
//! project when stock runs out and recommend how much to reorder. The
//! estimators are classical statistics (moving averages, exponential
//! smoothing, least-squares trend, weekly variance test); there is no trained
//! model anywhere in this crate.
//!
//! Boundaries:
//! - It does not depend on inventory aggregates; callers supply snapshots.
//! - It never mutates or persists anything. Every forecast is recomputed.
//! - The engine holds no cross-request state and is safe to share across threads.

pub mod confidence;
pub mod config;
pub mod engine;
pub mod insights;
pub mod projection;
pub mod report;
pub mod result;
pub mod seasonality;
pub mod series;
pub mod smoothing;
pub mod source;
pub mod trend;

pub use confidence::ConfidenceBand;
pub use config::{ConfigError, ForecastConfig};
pub use engine::ForecastEngine;
pub use insights::{ConfidenceLevel, Insight, TrendStrength};
pub use report::ForecastReport;
pub use result::{ForecastError, ForecastResult};
pub use seasonality::SeasonalityResult;
pub use series::DailyUsageSeries;
pub use source::{ForecastSource, ItemSnapshot, UsageEvent};
pub use trend::TrendFit;
