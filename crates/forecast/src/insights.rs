//! Qualitative flags derived from the numeric forecast.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ForecastConfig;
use crate::projection::Depletion;
use crate::seasonality::SeasonalityResult;
use crate::trend::TrendFit;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// One qualitative observation about an item's usage. Order in a result is
/// the order rules are evaluated in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insight {
    SeasonalPattern,
    IncreasingTrend,
    DecreasingTrend,
    UsageSpike,
    ExpiresBeforeDepletion { days_until_expiry: i64 },
}

impl core::fmt::Display for Insight {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Insight::SeasonalPattern => f.write_str("Seasonal usage pattern detected"),
            Insight::IncreasingTrend => f.write_str("Increasing usage trend"),
            Insight::DecreasingTrend => f.write_str("Decreasing usage trend"),
            Insight::UsageSpike => f.write_str("Recent spike in usage"),
            Insight::ExpiresBeforeDepletion { days_until_expiry } => {
                write!(f, "Item expires in {days_until_expiry} days (before depletion)")
            }
        }
    }
}

/// How much the trend line explains the series.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// `High` above `high`, `Medium` above `medium`, else `Low` (both strict).
    pub fn from_r_squared(r_squared: f64, high: f64, medium: f64) -> Self {
        if r_squared > high {
            ConfidenceLevel::High
        } else if r_squared > medium {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "Low",
            ConfidenceLevel::Medium => "Medium",
            ConfidenceLevel::High => "High",
        }
    }
}

impl core::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendStrength {
    Strong,
    Weak,
}

impl TrendStrength {
    pub fn from_slope(slope: f64, threshold: f64) -> Self {
        if slope.abs() > threshold {
            TrendStrength::Strong
        } else {
            TrendStrength::Weak
        }
    }
}

impl core::fmt::Display for TrendStrength {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TrendStrength::Strong => f.write_str("Strong"),
            TrendStrength::Weak => f.write_str("Weak"),
        }
    }
}

/// Whole days from `now` until `expiration`, rounded up.
pub fn days_until(expiration: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (expiration - now).num_milliseconds();
    millis.div_euclid(MILLIS_PER_DAY) + i64::from(millis.rem_euclid(MILLIS_PER_DAY) != 0)
}

/// Everything the insight rules look at.
#[derive(Debug, Clone, Copy)]
pub struct InsightInputs<'a> {
    pub seasonality: &'a SeasonalityResult,
    pub trend: &'a TrendFit,
    /// Rate before the seasonal uplift.
    pub base_rate: f64,
    pub long_moving_average: f64,
    pub depletion: &'a Depletion,
    pub expiration_date: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
}

/// Evaluate every rule independently, in a fixed order.
pub fn generate_insights(inputs: &InsightInputs<'_>, config: &ForecastConfig) -> Vec<Insight> {
    let mut insights = Vec::new();

    if inputs.seasonality.is_seasonal {
        insights.push(Insight::SeasonalPattern);
    }

    if inputs.trend.slope > config.trend_slope_threshold {
        insights.push(Insight::IncreasingTrend);
    } else if inputs.trend.slope < -config.trend_slope_threshold {
        insights.push(Insight::DecreasingTrend);
    }

    if inputs.base_rate > inputs.long_moving_average * config.spike_ratio {
        insights.push(Insight::UsageSpike);
    }

    if let Some(expiration) = inputs.expiration_date {
        let days_until_expiry = days_until(expiration, inputs.now);
        // Stock that never depletes always outlives its expiry.
        let before_depletion = inputs
            .depletion
            .days_until_depletion
            .is_none_or(|days| (days_until_expiry as u64) < days);
        if days_until_expiry > 0 && before_depletion {
            insights.push(Insight::ExpiresBeforeDepletion { days_until_expiry });
        }
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 31, 12, 0, 0).unwrap()
    }

    struct Case {
        seasonality: SeasonalityResult,
        trend: TrendFit,
        base_rate: f64,
        long_moving_average: f64,
        depletion: Depletion,
        expiration_date: Option<DateTime<Utc>>,
    }

    impl Default for Case {
        fn default() -> Self {
            Self {
                seasonality: SeasonalityResult::default(),
                trend: TrendFit::default(),
                base_rate: 1.0,
                long_moving_average: 1.0,
                depletion: Depletion { days_until_depletion: Some(30), depletion_date: None },
                expiration_date: None,
            }
        }
    }

    impl Case {
        fn run(&self) -> Vec<Insight> {
            let inputs = InsightInputs {
                seasonality: &self.seasonality,
                trend: &self.trend,
                base_rate: self.base_rate,
                long_moving_average: self.long_moving_average,
                depletion: &self.depletion,
                expiration_date: self.expiration_date,
                now: now(),
            };
            generate_insights(&inputs, &ForecastConfig::default())
        }
    }

    #[test]
    fn stable_usage_has_no_insights() {
        assert!(Case::default().run().is_empty());
    }

    #[test]
    fn all_rules_fire_in_order() {
        let case = Case {
            seasonality: SeasonalityResult { is_seasonal: true, pattern: vec![0.0; 7] },
            trend: TrendFit { slope: 0.25, intercept: 0.0, r_squared: 0.5 },
            base_rate: 4.0,
            long_moving_average: 2.0,
            expiration_date: Some(now() + Duration::days(10)),
            ..Case::default()
        };

        assert_eq!(
            case.run(),
            vec![
                Insight::SeasonalPattern,
                Insight::IncreasingTrend,
                Insight::UsageSpike,
                Insight::ExpiresBeforeDepletion { days_until_expiry: 10 },
            ]
        );
    }

    #[test]
    fn trend_thresholds_are_strict() {
        let flat = Case { trend: TrendFit { slope: 0.1, ..TrendFit::default() }, ..Case::default() };
        assert!(flat.run().is_empty());

        let down = Case { trend: TrendFit { slope: -0.11, ..TrendFit::default() }, ..Case::default() };
        assert_eq!(down.run(), vec![Insight::DecreasingTrend]);
    }

    #[test]
    fn spike_requires_strictly_more_than_ratio() {
        let at_ratio = Case { base_rate: 3.0, long_moving_average: 2.0, ..Case::default() };
        assert!(at_ratio.run().is_empty());
    }

    #[test]
    fn expiry_after_depletion_is_not_flagged() {
        let case = Case { expiration_date: Some(now() + Duration::days(45)), ..Case::default() };
        assert!(case.run().is_empty());

        let same_day = Case { expiration_date: Some(now() + Duration::days(30)), ..Case::default() };
        assert!(same_day.run().is_empty());
    }

    #[test]
    fn past_expiry_is_not_flagged() {
        let case = Case { expiration_date: Some(now() - Duration::days(2)), ..Case::default() };
        assert!(case.run().is_empty());
    }

    #[test]
    fn expiry_is_flagged_when_stock_never_depletes() {
        let case = Case {
            depletion: Depletion::never(),
            expiration_date: Some(now() + Duration::hours(36)),
            ..Case::default()
        };
        assert_eq!(case.run(), vec![Insight::ExpiresBeforeDepletion { days_until_expiry: 2 }]);
    }

    #[test]
    fn partial_days_round_up() {
        assert_eq!(days_until(now() + Duration::hours(1), now()), 1);
        assert_eq!(days_until(now() + Duration::days(3), now()), 3);
        assert_eq!(days_until(now() - Duration::hours(1), now()), 0);
        assert_eq!(days_until(now() - Duration::hours(25), now()), -1);
    }

    #[test]
    fn confidence_levels_use_strict_thresholds() {
        assert_eq!(ConfidenceLevel::from_r_squared(0.71, 0.7, 0.4), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_r_squared(0.7, 0.7, 0.4), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_r_squared(0.4, 0.7, 0.4), ConfidenceLevel::Low);
    }

    #[test]
    fn messages_match_dashboard_wording() {
        assert_eq!(
            Insight::ExpiresBeforeDepletion { days_until_expiry: 4 }.to_string(),
            "Item expires in 4 days (before depletion)"
        );
        assert_eq!(TrendStrength::from_slope(-0.2, 0.1).to_string(), "Strong");
    }
}
