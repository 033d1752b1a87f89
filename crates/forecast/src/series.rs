//! Daily usage time series.
//!
//! Discrete usage events are bucketed by UTC calendar day into a fixed-length,
//! zero-filled series. Index `0` is the oldest day and the last index is
//! `today`; downstream estimators rely on that order and never reorder it.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use clinic_core::AggregateId;

use crate::source::UsageEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyUsageSeries {
    start: NaiveDate,
    values: Vec<f64>,
}

/// Calendar-day key for a timestamp (UTC).
pub fn day_key(timestamp: DateTime<Utc>) -> NaiveDate {
    timestamp.date_naive()
}

/// First day of a `window_days`-long window ending at `today` (inclusive).
pub fn window_start(today: NaiveDate, window_days: usize) -> NaiveDate {
    let span = window_days.saturating_sub(1) as u64;
    today.checked_sub_days(Days::new(span)).unwrap_or(NaiveDate::MIN)
}

impl DailyUsageSeries {
    /// Sum `item_id`'s usage per day over the `window_days` days ending at `today`.
    ///
    /// Events for other items, malformed quantities and days outside the
    /// window are skipped without error. Day totals saturate at `f64::MAX`.
    pub fn aggregate(
        events: &[UsageEvent],
        item_id: AggregateId,
        today: NaiveDate,
        window_days: usize,
    ) -> Self {
        let start = window_start(today, window_days);
        let mut values = vec![0.0; window_days];

        for event in events {
            if event.item_id != item_id || !event.is_well_formed() {
                continue;
            }
            let offset = (day_key(event.timestamp) - start).num_days();
            if offset < 0 {
                continue;
            }
            if let Some(slot) = values.get_mut(offset as usize) {
                *slot = (*slot + event.quantity).min(f64::MAX);
            }
        }

        Self { start, values }
    }

    /// Series starting at `start` with one value per consecutive day.
    pub fn from_values(start: NaiveDate, values: Vec<f64>) -> Self {
        Self { start, values }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last covered day, `None` for an empty series.
    pub fn end(&self) -> Option<NaiveDate> {
        let len = self.values.len() as u64;
        if len == 0 {
            return None;
        }
        self.start.checked_add_days(Days::new(len - 1))
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Usage recorded on `day`, `None` outside the window.
    pub fn on(&self, day: NaiveDate) -> Option<f64> {
        let offset = (day - self.start).num_days();
        if offset < 0 {
            return None;
        }
        self.values.get(offset as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 31).unwrap()
    }

    fn event(item_id: AggregateId, qty: f64, y: i32, m: u32, d: u32, h: u32) -> UsageEvent {
        UsageEvent::new(item_id, qty, Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap(), "appointment")
    }

    #[test]
    fn empty_history_is_zero_filled_to_window_length() {
        let series = DailyUsageSeries::aggregate(&[], AggregateId::new(), today(), 60);
        assert_eq!(series.len(), 60);
        assert!(series.values().iter().all(|v| *v == 0.0));
        assert_eq!(series.end(), Some(today()));
        assert_eq!(series.start(), NaiveDate::from_ymd_opt(2026, 4, 2).unwrap());
    }

    #[test]
    fn same_day_events_are_summed_and_placed_chronologically() {
        let item = AggregateId::new();
        let events = vec![
            event(item, 2.0, 2026, 5, 31, 8),
            event(item, 1.5, 2026, 5, 29, 23),
            event(item, 3.0, 2026, 5, 31, 17),
        ];
        let series = DailyUsageSeries::aggregate(&events, item, today(), 5);

        assert_eq!(series.values(), &[0.0, 0.0, 1.5, 0.0, 5.0]);
    }

    #[test]
    fn buckets_by_utc_calendar_day() {
        let item = AggregateId::new();
        let events = vec![
            event(item, 1.0, 2026, 5, 30, 23),
            UsageEvent::new(item, 4.0, Utc.with_ymd_and_hms(2026, 5, 31, 0, 0, 0).unwrap(), "surgery"),
        ];
        let series = DailyUsageSeries::aggregate(&events, item, today(), 2);

        assert_eq!(series.values(), &[1.0, 4.0]);
    }

    #[test]
    fn skips_foreign_malformed_and_out_of_window_events() {
        let item = AggregateId::new();
        let events = vec![
            event(AggregateId::new(), 9.0, 2026, 5, 31, 10),
            event(item, -2.0, 2026, 5, 31, 10),
            event(item, f64::NAN, 2026, 5, 31, 10),
            event(item, 0.0, 2026, 5, 31, 10),
            event(item, 7.0, 2026, 1, 1, 10),
            event(item, 7.0, 2026, 6, 1, 10),
            event(item, 1.0, 2026, 5, 30, 10),
        ];
        let series = DailyUsageSeries::aggregate(&events, item, today(), 3);

        assert_eq!(series.values(), &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn huge_same_day_totals_saturate_instead_of_overflowing() {
        let item = AggregateId::new();
        let events = vec![event(item, 1e308, 2026, 5, 31, 8), event(item, 1e308, 2026, 5, 31, 9)];
        let series = DailyUsageSeries::aggregate(&events, item, today(), 2);

        assert_eq!(series.values(), &[0.0, f64::MAX]);
        assert!(series.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn zero_window_yields_empty_series() {
        let series = DailyUsageSeries::aggregate(&[], AggregateId::new(), today(), 0);
        assert!(series.is_empty());
        assert_eq!(series.end(), None);
    }

    #[test]
    fn lookup_by_day() {
        let item = AggregateId::new();
        let series = DailyUsageSeries::aggregate(&[event(item, 2.0, 2026, 5, 30, 12)], item, today(), 7);

        assert_eq!(series.on(NaiveDate::from_ymd_opt(2026, 5, 30).unwrap()), Some(2.0));
        assert_eq!(series.on(NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()), None);
        assert_eq!(series.on(NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the series length is the window and in-window usage is conserved.
        #[test]
        fn length_is_fixed_and_total_is_conserved(
            entries in prop::collection::vec((0u64..90, 1u32..50), 0..40),
            window in 1usize..75,
        ) {
            let item = AggregateId::new();
            let noon = Utc.with_ymd_and_hms(2026, 5, 31, 12, 0, 0).unwrap();
            let events: Vec<UsageEvent> = entries
                .iter()
                .map(|(back, qty)| {
                    let ts = noon - chrono::Duration::days(*back as i64);
                    UsageEvent::new(item, *qty as f64, ts, "usage")
                })
                .collect();

            let series = DailyUsageSeries::aggregate(&events, item, today(), window);
            let expected: f64 = entries
                .iter()
                .filter(|(back, _)| (*back as usize) < window)
                .map(|(_, qty)| *qty as f64)
                .sum();

            prop_assert_eq!(series.len(), window);
            prop_assert!((series.total() - expected).abs() < 1e-9);
        }
    }
}
