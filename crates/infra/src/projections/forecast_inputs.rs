//! Forecast inputs projection.
//!
//! Folds inventory events into what the forecasting engine reads: one
//! `ItemSnapshot` per item and the item's usage log (one `UsageEvent` per
//! `StockConsumed`). Tenant-isolated, disposable and rebuildable from the
//! event stream.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use clinic_core::{AggregateId, TenantId};
use clinic_forecast::{ForecastError, ForecastSource, ItemSnapshot, UsageEvent};
use clinic_inventory::InventoryEvent;

/// Tenant+item key; also the cursor key of the item's event stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct StreamKey {
    tenant_id: TenantId,
    item_id: AggregateId,
}

#[derive(Debug, Clone)]
struct ItemInputs {
    snapshot: ItemSnapshot,
    usage: Vec<UsageEvent>,
    newest_usage: Option<DateTime<Utc>>,
}

impl ItemInputs {
    /// Append and drop usage older than `retention` before the newest event.
    fn record_usage(&mut self, usage: UsageEvent, retention: Duration) {
        let newest = self
            .newest_usage
            .map_or(usage.timestamp, |newest| newest.max(usage.timestamp));
        self.newest_usage = Some(newest);
        self.usage.push(usage);

        if let Some(cutoff) = newest.checked_sub_signed(retention) {
            self.usage.retain(|u| u.timestamp >= cutoff);
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },

    #[error("stock event for unknown item {0}")]
    UnknownItem(AggregateId),

    #[error("read model lock poisoned")]
    Poisoned,
}

/// One event of an item stream, as delivered by the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamedEvent {
    pub tenant_id: TenantId,
    /// Position in the item's stream, starting at 1.
    pub sequence_number: u64,
    pub event: InventoryEvent,
}

/// Usage kept per item, measured back from its newest usage event.
pub const DEFAULT_USAGE_RETENTION_DAYS: i64 = 365;

#[derive(Debug)]
pub struct ForecastInputsProjection {
    items: RwLock<HashMap<StreamKey, ItemInputs>>,
    cursors: RwLock<HashMap<StreamKey, u64>>,
    retention: Duration,
}

impl Default for ForecastInputsProjection {
    fn default() -> Self {
        Self {
            items: RwLock::default(),
            cursors: RwLock::default(),
            retention: Duration::days(DEFAULT_USAGE_RETENTION_DAYS),
        }
    }
}

impl ForecastInputsProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `days` of usage history per item. Must cover the forecast lookback
    /// window; older usage is never read.
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention = Duration::days(i64::from(days));
        self
    }

    /// Apply one delivered event.
    ///
    /// - Enforces tenant isolation (event tenant must match the stream's)
    /// - Enforces strictly increasing sequence per (tenant, item) stream
    /// - Idempotent for at-least-once delivery (replays <= cursor are ignored)
    ///
    /// Returns whether the event changed the read model.
    pub fn apply(
        &self,
        tenant_id: TenantId,
        sequence_number: u64,
        event: &InventoryEvent,
    ) -> Result<bool, ProjectionError> {
        if event.tenant_id() != tenant_id {
            return Err(ProjectionError::TenantIsolation(
                "event tenant_id does not match stream tenant_id".to_string(),
            ));
        }

        let key = StreamKey {
            tenant_id,
            item_id: event.item_id().0,
        };

        let mut cursors = self.cursors.write().map_err(|_| ProjectionError::Poisoned)?;
        let last = cursors.get(&key).copied().unwrap_or(0);

        if sequence_number == 0 {
            return Err(ProjectionError::NonMonotonicSequence {
                last,
                found: sequence_number,
            });
        }
        if sequence_number <= last {
            return Ok(false);
        }
        if last != 0 && sequence_number != last + 1 {
            return Err(ProjectionError::NonMonotonicSequence {
                last,
                found: sequence_number,
            });
        }

        let mut items = self.items.write().map_err(|_| ProjectionError::Poisoned)?;
        match event {
            InventoryEvent::ItemCreated(e) => {
                let snapshot = ItemSnapshot {
                    item_id: key.item_id,
                    name: e.name.clone(),
                    current_stock: e.initial_stock.max(0).unsigned_abs(),
                    expiration_date: e.expiration_date,
                };
                items.insert(
                    key,
                    ItemInputs {
                        snapshot,
                        usage: Vec::new(),
                        newest_usage: None,
                    },
                );
            }
            InventoryEvent::StockRestocked(e) => {
                let inputs = items.get_mut(&key).ok_or(ProjectionError::UnknownItem(key.item_id))?;
                inputs.snapshot.current_stock = inputs
                    .snapshot
                    .current_stock
                    .saturating_add(e.quantity.max(0).unsigned_abs());
                if e.expiration_date.is_some() {
                    inputs.snapshot.expiration_date = e.expiration_date;
                }
            }
            InventoryEvent::StockConsumed(e) => {
                let inputs = items.get_mut(&key).ok_or(ProjectionError::UnknownItem(key.item_id))?;
                let quantity = e.quantity.max(0).unsigned_abs();
                inputs.snapshot.current_stock = inputs.snapshot.current_stock.saturating_sub(quantity);
                inputs.record_usage(
                    UsageEvent::new(key.item_id, quantity as f64, e.occurred_at, e.reason.clone()),
                    self.retention,
                );
            }
        }

        cursors.insert(key, sequence_number);
        Ok(true)
    }

    /// Drop everything and replay `events` in (tenant, item, sequence) order.
    pub fn rebuild_from_scratch(
        &self,
        events: impl IntoIterator<Item = StreamedEvent>,
    ) -> Result<(), ProjectionError> {
        self.items.write().map_err(|_| ProjectionError::Poisoned)?.clear();
        self.cursors.write().map_err(|_| ProjectionError::Poisoned)?.clear();

        let mut events: Vec<_> = events.into_iter().collect();
        events.sort_by_key(|e| {
            (
                *e.tenant_id.as_uuid().as_bytes(),
                *e.event.item_id().0.as_uuid().as_bytes(),
                e.sequence_number,
            )
        });

        for e in &events {
            self.apply(e.tenant_id, e.sequence_number, &e.event)?;
        }
        Ok(())
    }

    pub fn snapshot(&self, tenant_id: TenantId, item_id: AggregateId) -> Option<ItemSnapshot> {
        let items = self.items.read().ok()?;
        items
            .get(&StreamKey { tenant_id, item_id })
            .map(|inputs| inputs.snapshot.clone())
    }
}

impl ForecastSource for ForecastInputsProjection {
    fn item_snapshot(
        &self,
        tenant_id: TenantId,
        item_id: AggregateId,
    ) -> Result<Option<ItemSnapshot>, ForecastError> {
        let items = self
            .items
            .read()
            .map_err(|_| ForecastError::source("forecast inputs lock poisoned"))?;
        Ok(items
            .get(&StreamKey { tenant_id, item_id })
            .map(|inputs| inputs.snapshot.clone()))
    }

    fn usage_history(
        &self,
        tenant_id: TenantId,
        item_id: AggregateId,
        since: DateTime<Utc>,
    ) -> Result<Vec<UsageEvent>, ForecastError> {
        let items = self
            .items
            .read()
            .map_err(|_| ForecastError::source("forecast inputs lock poisoned"))?;
        Ok(items
            .get(&StreamKey { tenant_id, item_id })
            .map(|inputs| {
                inputs
                    .usage
                    .iter()
                    .filter(|u| u.timestamp >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn item_ids(&self, tenant_id: TenantId) -> Result<Vec<AggregateId>, ForecastError> {
        let items = self
            .items
            .read()
            .map_err(|_| ForecastError::source("forecast inputs lock poisoned"))?;
        let mut ids: Vec<AggregateId> = items
            .keys()
            .filter(|k| k.tenant_id == tenant_id)
            .map(|k| k.item_id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use clinic_inventory::{InventoryItemId, ItemCreated, StockConsumed, StockRestocked};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap()
    }

    fn created(tenant_id: TenantId, item_id: InventoryItemId, stock: i64) -> InventoryEvent {
        InventoryEvent::ItemCreated(ItemCreated {
            tenant_id,
            item_id,
            name: "Amoxicillin".to_string(),
            category: "medication".to_string(),
            initial_stock: stock,
            min_threshold: 5,
            expiration_date: None,
            batch_number: None,
            occurred_at: t0(),
        })
    }

    fn consumed(tenant_id: TenantId, item_id: InventoryItemId, qty: i64, days: i64) -> InventoryEvent {
        InventoryEvent::StockConsumed(StockConsumed {
            tenant_id,
            item_id,
            quantity: qty,
            reason: "appointment".to_string(),
            occurred_at: t0() + Duration::days(days),
        })
    }

    fn restocked(tenant_id: TenantId, item_id: InventoryItemId, qty: i64) -> InventoryEvent {
        InventoryEvent::StockRestocked(StockRestocked {
            tenant_id,
            item_id,
            quantity: qty,
            expiration_date: Some(t0() + Duration::days(90)),
            batch_number: Some("B-7".to_string()),
            occurred_at: t0() + Duration::days(3),
        })
    }

    #[test]
    fn folds_stock_and_usage() {
        let projection = ForecastInputsProjection::new();
        let tenant_id = TenantId::new();
        let item_id = InventoryItemId::new(AggregateId::new());

        projection.apply(tenant_id, 1, &created(tenant_id, item_id, 20)).unwrap();
        projection.apply(tenant_id, 2, &consumed(tenant_id, item_id, 3, 1)).unwrap();
        projection.apply(tenant_id, 3, &restocked(tenant_id, item_id, 10)).unwrap();
        projection.apply(tenant_id, 4, &consumed(tenant_id, item_id, 4, 5)).unwrap();

        let snapshot = projection.snapshot(tenant_id, item_id.0).unwrap();
        assert_eq!(snapshot.current_stock, 23);
        assert_eq!(snapshot.expiration_date, Some(t0() + Duration::days(90)));

        let usage = projection.usage_history(tenant_id, item_id.0, t0()).unwrap();
        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].quantity, 3.0);
        assert_eq!(usage[1].timestamp, t0() + Duration::days(5));

        let recent = projection
            .usage_history(tenant_id, item_id.0, t0() + Duration::days(2))
            .unwrap();
        assert_eq!(recent.len(), 1);
    }

    #[test]
    fn replays_are_ignored_and_gaps_rejected() {
        let projection = ForecastInputsProjection::new();
        let tenant_id = TenantId::new();
        let item_id = InventoryItemId::new(AggregateId::new());

        assert!(projection.apply(tenant_id, 1, &created(tenant_id, item_id, 20)).unwrap());
        assert!(projection.apply(tenant_id, 2, &consumed(tenant_id, item_id, 3, 1)).unwrap());
        assert!(!projection.apply(tenant_id, 2, &consumed(tenant_id, item_id, 3, 1)).unwrap());

        let err = projection
            .apply(tenant_id, 5, &consumed(tenant_id, item_id, 1, 2))
            .unwrap_err();
        assert_eq!(err, ProjectionError::NonMonotonicSequence { last: 2, found: 5 });

        assert_eq!(projection.snapshot(tenant_id, item_id.0).unwrap().current_stock, 17);
    }

    #[test]
    fn tenants_are_isolated() {
        let projection = ForecastInputsProjection::new();
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let item_id = InventoryItemId::new(AggregateId::new());

        projection.apply(tenant_a, 1, &created(tenant_a, item_id, 20)).unwrap();

        let err = projection.apply(tenant_b, 2, &consumed(tenant_a, item_id, 1, 1)).unwrap_err();
        assert!(matches!(err, ProjectionError::TenantIsolation(_)));

        assert_eq!(projection.item_snapshot(tenant_b, item_id.0).unwrap(), None);
        assert!(projection.item_ids(tenant_b).unwrap().is_empty());
        assert_eq!(projection.item_ids(tenant_a).unwrap(), vec![item_id.0]);
    }

    #[test]
    fn stock_events_before_creation_are_rejected() {
        let projection = ForecastInputsProjection::new();
        let tenant_id = TenantId::new();
        let item_id = InventoryItemId::new(AggregateId::new());

        let err = projection.apply(tenant_id, 1, &consumed(tenant_id, item_id, 1, 0)).unwrap_err();
        assert_eq!(err, ProjectionError::UnknownItem(item_id.0));
    }

    #[test]
    fn usage_older_than_retention_is_dropped() {
        let projection = ForecastInputsProjection::new().with_retention_days(30);
        let tenant_id = TenantId::new();
        let item_id = InventoryItemId::new(AggregateId::new());

        projection.apply(tenant_id, 1, &created(tenant_id, item_id, 500)).unwrap();
        for (seq, day) in [(2, 0), (3, 10), (4, 45), (5, 40), (6, 80)] {
            projection.apply(tenant_id, seq, &consumed(tenant_id, item_id, 1, day)).unwrap();
        }

        let kept: Vec<_> = projection
            .usage_history(tenant_id, item_id.0, t0() - Duration::days(365))
            .unwrap()
            .iter()
            .map(|u| (u.timestamp - t0()).num_days())
            .collect();
        assert_eq!(kept, vec![80]);

        // Stock still reflects every consumption.
        assert_eq!(projection.snapshot(tenant_id, item_id.0).unwrap().current_stock, 495);
    }

    #[test]
    fn late_arriving_usage_is_kept_within_retention() {
        let projection = ForecastInputsProjection::new().with_retention_days(30);
        let tenant_id = TenantId::new();
        let item_id = InventoryItemId::new(AggregateId::new());

        projection.apply(tenant_id, 1, &created(tenant_id, item_id, 50)).unwrap();
        projection.apply(tenant_id, 2, &consumed(tenant_id, item_id, 1, 40)).unwrap();
        projection.apply(tenant_id, 3, &consumed(tenant_id, item_id, 1, 20)).unwrap();
        projection.apply(tenant_id, 4, &consumed(tenant_id, item_id, 1, 5)).unwrap();

        let usage = projection.usage_history(tenant_id, item_id.0, t0()).unwrap();
        assert_eq!(usage.len(), 2);
    }

    #[test]
    fn rebuild_orders_by_sequence() {
        let projection = ForecastInputsProjection::new();
        let tenant_id = TenantId::new();
        let item_id = InventoryItemId::new(AggregateId::new());

        let stream = vec![
            StreamedEvent { tenant_id, sequence_number: 3, event: consumed(tenant_id, item_id, 2, 2) },
            StreamedEvent { tenant_id, sequence_number: 1, event: created(tenant_id, item_id, 10) },
            StreamedEvent { tenant_id, sequence_number: 2, event: consumed(tenant_id, item_id, 1, 1) },
        ];
        projection.rebuild_from_scratch(stream.clone()).unwrap();
        projection.rebuild_from_scratch(stream).unwrap();

        assert_eq!(projection.snapshot(tenant_id, item_id.0).unwrap().current_stock, 7);
        assert_eq!(projection.usage_history(tenant_id, item_id.0, t0()).unwrap().len(), 2);
    }
}
