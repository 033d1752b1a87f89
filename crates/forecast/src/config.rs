//! Forecast tuning knobs.
//!
//! Every constant the estimators use lives here so deployments can override
//! it. The seasonal variance ratio and seasonal uplift in particular are
//! heuristics with no statistical derivation; they are kept at the values the
//! clinic dashboard has always used.

use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_LOOKBACK_DAYS: usize = 60;
/// Ten years of daily buckets.
pub const MAX_LOOKBACK_DAYS: usize = 3650;
pub const DEFAULT_HORIZON_DAYS: u32 = 30;
pub const DEFAULT_SHORT_WINDOW: usize = 7;
pub const DEFAULT_LONG_WINDOW: usize = 14;
pub const DEFAULT_SMOOTHING_ALPHA: f64 = 0.3;
pub const DEFAULT_SEASONAL_PERIOD: usize = 7;
pub const DEFAULT_SEASONAL_VARIANCE_RATIO: f64 = 0.10;
pub const DEFAULT_SEASONAL_UPLIFT: f64 = 1.10;
pub const DEFAULT_BACKTEST_WINDOW: usize = 14;
/// Two-sided 95% under a normal error assumption.
pub const DEFAULT_Z_SCORE: f64 = 1.96;
pub const DEFAULT_LEAD_TIME_DAYS: u32 = 7;
pub const DEFAULT_SAFETY_STOCK_DAYS: u32 = 3;
pub const DEFAULT_TREND_SLOPE_THRESHOLD: f64 = 0.1;
pub const DEFAULT_SPIKE_RATIO: f64 = 1.5;
pub const DEFAULT_HIGH_CONFIDENCE_R2: f64 = 0.7;
pub const DEFAULT_MEDIUM_CONFIDENCE_R2: f64 = 0.4;

const ENV_PREFIX: &str = "CLINIC_FORECAST_";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    /// Days of history turned into the daily series.
    pub lookback_days: usize,
    /// Horizon used when the caller does not ask for one.
    pub horizon_days: u32,
    pub short_window: usize,
    pub long_window: usize,
    pub smoothing_alpha: f64,
    pub seasonal_period: usize,
    /// Seasonal when phase variance exceeds this share of total variance.
    pub seasonal_variance_ratio: f64,
    /// Rate multiplier applied when a seasonal pattern is detected.
    pub seasonal_uplift: f64,
    pub backtest_window: usize,
    pub z_score: f64,
    pub lead_time_days: u32,
    pub safety_stock_days: u32,
    pub trend_slope_threshold: f64,
    pub spike_ratio: f64,
    pub high_confidence_r_squared: f64,
    pub medium_confidence_r_squared: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            horizon_days: DEFAULT_HORIZON_DAYS,
            short_window: DEFAULT_SHORT_WINDOW,
            long_window: DEFAULT_LONG_WINDOW,
            smoothing_alpha: DEFAULT_SMOOTHING_ALPHA,
            seasonal_period: DEFAULT_SEASONAL_PERIOD,
            seasonal_variance_ratio: DEFAULT_SEASONAL_VARIANCE_RATIO,
            seasonal_uplift: DEFAULT_SEASONAL_UPLIFT,
            backtest_window: DEFAULT_BACKTEST_WINDOW,
            z_score: DEFAULT_Z_SCORE,
            lead_time_days: DEFAULT_LEAD_TIME_DAYS,
            safety_stock_days: DEFAULT_SAFETY_STOCK_DAYS,
            trend_slope_threshold: DEFAULT_TREND_SLOPE_THRESHOLD,
            spike_ratio: DEFAULT_SPIKE_RATIO,
            high_confidence_r_squared: DEFAULT_HIGH_CONFIDENCE_R2,
            medium_confidence_r_squared: DEFAULT_MEDIUM_CONFIDENCE_R2,
        }
    }
}

impl ForecastConfig {
    /// Defaults overridden by `CLINIC_FORECAST_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each
    /// `CLINIC_FORECAST_*` key. Unset keys keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key).map(|value| (key, value))
        };

        if let Some((key, value)) = get("LOOKBACK_DAYS") {
            config.lookback_days = parse(&key, &value)?;
        }
        if let Some((key, value)) = get("HORIZON_DAYS") {
            config.horizon_days = parse(&key, &value)?;
        }
        if let Some((key, value)) = get("LEAD_TIME_DAYS") {
            config.lead_time_days = parse(&key, &value)?;
        }
        if let Some((key, value)) = get("SAFETY_STOCK_DAYS") {
            config.safety_stock_days = parse(&key, &value)?;
        }
        if let Some((key, value)) = get("SMOOTHING_ALPHA") {
            config.smoothing_alpha = parse(&key, &value)?;
        }
        if let Some((key, value)) = get("SEASONAL_VARIANCE_RATIO") {
            config.seasonal_variance_ratio = parse(&key, &value)?;
        }
        if let Some((key, value)) = get("SEASONAL_UPLIFT") {
            config.seasonal_uplift = parse(&key, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_lookback_days(mut self, days: usize) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_horizon_days(mut self, days: u32) -> Self {
        self.horizon_days = days;
        self
    }

    pub fn with_lead_time_days(mut self, days: u32) -> Self {
        self.lead_time_days = days;
        self
    }

    pub fn with_safety_stock_days(mut self, days: u32) -> Self {
        self.safety_stock_days = days;
        self
    }

    pub fn with_smoothing_alpha(mut self, alpha: f64) -> Self {
        self.smoothing_alpha = alpha;
        self
    }

    pub fn with_seasonal_variance_ratio(mut self, ratio: f64) -> Self {
        self.seasonal_variance_ratio = ratio;
        self
    }

    pub fn with_seasonal_uplift(mut self, uplift: f64) -> Self {
        self.seasonal_uplift = uplift;
        self
    }

    /// Reject values the estimators cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookback_days == 0 || self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(ConfigError::invalid(
                "lookback_days",
                self.lookback_days,
                format!("must be between 1 and {MAX_LOOKBACK_DAYS}"),
            ));
        }
        if !(self.smoothing_alpha.is_finite() && self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(ConfigError::invalid(
                "smoothing_alpha",
                self.smoothing_alpha,
                "must be in (0, 1]",
            ));
        }
        if !(self.seasonal_variance_ratio.is_finite() && self.seasonal_variance_ratio >= 0.0) {
            return Err(ConfigError::invalid(
                "seasonal_variance_ratio",
                self.seasonal_variance_ratio,
                "must be a finite non-negative number",
            ));
        }
        if !(self.seasonal_uplift.is_finite() && self.seasonal_uplift > 0.0) {
            return Err(ConfigError::invalid(
                "seasonal_uplift",
                self.seasonal_uplift,
                "must be a finite positive number",
            ));
        }
        if !(self.z_score.is_finite() && self.z_score >= 0.0) {
            return Err(ConfigError::invalid("z_score", self.z_score, "must be a finite non-negative number"));
        }
        Ok(())
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(key, value, "not a valid number"))
}
