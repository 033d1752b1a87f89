//! Forecast orchestration: one item, one horizon.

use chrono::{DateTime, NaiveTime, Utc};
use tracing::debug;

use clinic_core::{AggregateId, TenantId};

use crate::confidence;
use crate::config::ForecastConfig;
use crate::insights::{self, ConfidenceLevel, InsightInputs};
use crate::projection;
use crate::result::{ForecastError, ForecastResult};
use crate::seasonality;
use crate::series::{self, DailyUsageSeries};
use crate::smoothing;
use crate::source::{ForecastSource, ItemSnapshot, UsageEvent};
use crate::trend;

/// Stateless forecasting engine.
///
/// Holds only configuration, so one instance can serve concurrent requests
/// for any number of items.
#[derive(Debug, Clone, Default)]
pub struct ForecastEngine {
    config: ForecastConfig,
}

impl ForecastEngine {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Read the item and its usage from `source`, then forecast.
    ///
    /// Fails with `ItemNotFound` only when the snapshot is missing; an item
    /// with no usage still gets a full (zero-rate) forecast.
    pub fn forecast_item<S>(
        &self,
        source: &S,
        tenant_id: TenantId,
        item_id: AggregateId,
        horizon_days: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<ForecastResult, ForecastError>
    where
        S: ForecastSource + ?Sized,
    {
        let item = source
            .item_snapshot(tenant_id, item_id)?
            .ok_or_else(|| ForecastError::item_not_found(item_id))?;

        let since = series::window_start(now.date_naive(), self.config.lookback_days)
            .and_time(NaiveTime::MIN)
            .and_utc();
        let usage = source.usage_history(tenant_id, item_id, since)?;

        debug!(
            tenant = %tenant_id,
            item = %item_id,
            events = usage.len(),
            "loaded forecast inputs"
        );

        Ok(self.forecast(&item, &usage, horizon_days, now))
    }

    /// Forecast from already-loaded inputs. Pure; never fails.
    ///
    /// `horizon_days` falls back to the configured default.
    pub fn forecast(
        &self,
        item: &ItemSnapshot,
        usage: &[UsageEvent],
        horizon_days: Option<u32>,
        now: DateTime<Utc>,
    ) -> ForecastResult {
        let series = DailyUsageSeries::aggregate(usage, item.item_id, now.date_naive(), self.config.lookback_days);
        self.forecast_series(item, &series, horizon_days, now)
    }

    /// Forecast from an already-aggregated daily series.
    pub fn forecast_series(
        &self,
        item: &ItemSnapshot,
        series: &DailyUsageSeries,
        horizon_days: Option<u32>,
        now: DateTime<Utc>,
    ) -> ForecastResult {
        let cfg = &self.config;
        let horizon_days = horizon_days.unwrap_or(cfg.horizon_days);
        let values = series.values();

        let short_moving_average = smoothing::moving_average(values, cfg.short_window);
        let long_moving_average = smoothing::moving_average(values, cfg.long_window);
        let smoothed_level = smoothing::exponential_smoothing(values, cfg.smoothing_alpha);
        let trend = trend::linear_trend(values);
        let seasonality =
            seasonality::detect_seasonality(values, cfg.seasonal_period, cfg.seasonal_variance_ratio);
        let confidence_band =
            confidence::backtest(values, cfg.backtest_window, smoothed_level, &trend, cfg.z_score);

        let base_daily_rate = projection::effective_rate(short_moving_average, smoothed_level);
        let daily_usage_rate =
            projection::seasonally_adjusted(base_daily_rate, seasonality.is_seasonal, cfg.seasonal_uplift);

        let depletion = projection::project_depletion(item.current_stock, daily_usage_rate, now);
        let reorder = projection::recommend_reorder(
            daily_usage_rate,
            cfg.lead_time_days,
            horizon_days,
            cfg.safety_stock_days,
        );

        let confidence_level = ConfidenceLevel::from_r_squared(
            trend.r_squared,
            cfg.high_confidence_r_squared,
            cfg.medium_confidence_r_squared,
        );
        let insights = insights::generate_insights(
            &InsightInputs {
                seasonality: &seasonality,
                trend: &trend,
                base_rate: base_daily_rate,
                long_moving_average,
                depletion: &depletion,
                expiration_date: item.expiration_date,
                now,
            },
            cfg,
        );

        debug!(
            item = %item.item_id,
            rate = daily_usage_rate,
            days_until_depletion = ?depletion.days_until_depletion,
            reorder = reorder.quantity,
            seasonal = seasonality.is_seasonal,
            r_squared = trend.r_squared,
            "forecast computed"
        );

        ForecastResult {
            item_id: item.item_id,
            item_name: item.name.clone(),
            current_stock: item.current_stock,
            expiration_date: item.expiration_date,
            generated_at: now,
            horizon_days,
            short_moving_average,
            long_moving_average,
            smoothed_level,
            trend,
            seasonality,
            confidence_band,
            base_daily_rate,
            daily_usage_rate,
            depletion,
            reorder,
            confidence_level,
            insights,
        }
    }
}
