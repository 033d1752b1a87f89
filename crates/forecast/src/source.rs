use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clinic_core::{AggregateId, TenantId};

use crate::result::ForecastError;

/// Point-in-time view of one stocked item, read once per forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub item_id: AggregateId,
    pub name: String,
    pub current_stock: u64,
    pub expiration_date: Option<DateTime<Utc>>,
}

impl ItemSnapshot {
    pub fn new(item_id: AggregateId, name: impl Into<String>, current_stock: u64) -> Self {
        Self {
            item_id,
            name: name.into(),
            current_stock,
            expiration_date: None,
        }
    }

    pub fn with_expiration(mut self, expiration_date: DateTime<Utc>) -> Self {
        self.expiration_date = Some(expiration_date);
        self
    }
}

/// One recorded consumption of an item (a stock decrement with its reason).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEvent {
    pub item_id: AggregateId,
    pub quantity: f64,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

impl UsageEvent {
    pub fn new(item_id: AggregateId, quantity: f64, timestamp: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self {
            item_id,
            quantity,
            timestamp,
            reason: reason.into(),
        }
    }

    /// Usage records must carry a finite, strictly positive quantity.
    pub fn is_well_formed(&self) -> bool {
        self.quantity.is_finite() && self.quantity > 0.0
    }
}

/// Read-only collaborator that supplies forecast inputs.
///
/// Implementations own storage and tenancy; the engine only reads. The two
/// per-item reads are independent and may be served from different stores.
pub trait ForecastSource: Send + Sync {
    /// Snapshot of an item, or `None` when the tenant has no such item.
    fn item_snapshot(
        &self,
        tenant_id: TenantId,
        item_id: AggregateId,
    ) -> Result<Option<ItemSnapshot>, ForecastError>;

    /// Usage events of an item recorded at or after `since`.
    fn usage_history(
        &self,
        tenant_id: TenantId,
        item_id: AggregateId,
        since: DateTime<Utc>,
    ) -> Result<Vec<UsageEvent>, ForecastError>;

    /// Every item the tenant currently stocks.
    fn item_ids(&self, tenant_id: TenantId) -> Result<Vec<AggregateId>, ForecastError>;
}

impl<S> ForecastSource for std::sync::Arc<S>
where
    S: ForecastSource + ?Sized,
{
    fn item_snapshot(
        &self,
        tenant_id: TenantId,
        item_id: AggregateId,
    ) -> Result<Option<ItemSnapshot>, ForecastError> {
        (**self).item_snapshot(tenant_id, item_id)
    }

    fn usage_history(
        &self,
        tenant_id: TenantId,
        item_id: AggregateId,
        since: DateTime<Utc>,
    ) -> Result<Vec<UsageEvent>, ForecastError> {
        (**self).usage_history(tenant_id, item_id, since)
    }

    fn item_ids(&self, tenant_id: TenantId) -> Result<Vec<AggregateId>, ForecastError> {
        (**self).item_ids(tenant_id)
    }
}
