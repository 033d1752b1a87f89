use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clinic_core::{Aggregate, AggregateId, DomainError, TenantId};

/// Inventory item identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryItemId(pub AggregateId);

impl InventoryItemId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InventoryItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: a stocked clinic supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    id: InventoryItemId,
    tenant_id: Option<TenantId>,
    name: String,
    category: String,
    stock: i64,
    min_threshold: i64,
    expiration_date: Option<DateTime<Utc>>,
    batch_number: Option<String>,
    last_restocked: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl InventoryItem {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: InventoryItemId) -> Self {
        Self {
            id,
            tenant_id: None,
            name: String::new(),
            category: String::new(),
            stock: 0,
            min_threshold: 0,
            expiration_date: None,
            batch_number: None,
            last_restocked: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> InventoryItemId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Units on hand. Never negative.
    pub fn stock(&self) -> i64 {
        self.stock
    }

    pub fn expiration_date(&self) -> Option<DateTime<Utc>> {
        self.expiration_date
    }

    pub fn batch_number(&self) -> Option<&str> {
        self.batch_number.as_deref()
    }

    pub fn last_restocked(&self) -> Option<DateTime<Utc>> {
        self.last_restocked
    }

    pub fn is_low_stock(&self) -> bool {
        self.created && self.stock <= self.min_threshold
    }
}

/// Command: CreateItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateItem {
    pub tenant_id: TenantId,
    pub item_id: InventoryItemId,
    pub name: String,
    pub category: String,
    pub initial_stock: i64,
    pub min_threshold: i64,
    pub expiration_date: Option<DateTime<Utc>>,
    pub batch_number: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateStock.
///
/// Negative `quantity_change` records consumption (with `reason`), positive
/// records a restock (optionally with the new batch's expiry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStock {
    pub tenant_id: TenantId,
    pub item_id: InventoryItemId,
    pub quantity_change: i64,
    pub reason: String,
    pub expiration_date: Option<DateTime<Utc>>,
    pub batch_number: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryCommand {
    CreateItem(CreateItem),
    UpdateStock(UpdateStock),
}

/// Event: ItemCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCreated {
    pub tenant_id: TenantId,
    pub item_id: InventoryItemId,
    pub name: String,
    pub category: String,
    pub initial_stock: i64,
    pub min_threshold: i64,
    pub expiration_date: Option<DateTime<Utc>>,
    pub batch_number: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockRestocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRestocked {
    pub tenant_id: TenantId,
    pub item_id: InventoryItemId,
    pub quantity: i64,
    pub expiration_date: Option<DateTime<Utc>>,
    pub batch_number: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockConsumed. One usage record; immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockConsumed {
    pub tenant_id: TenantId,
    pub item_id: InventoryItemId,
    pub quantity: i64,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    ItemCreated(ItemCreated),
    StockRestocked(StockRestocked),
    StockConsumed(StockConsumed),
}

impl InventoryEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ItemCreated(_) => "inventory.item.created",
            InventoryEvent::StockRestocked(_) => "inventory.item.stock_restocked",
            InventoryEvent::StockConsumed(_) => "inventory.item.stock_consumed",
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        match self {
            InventoryEvent::ItemCreated(e) => e.tenant_id,
            InventoryEvent::StockRestocked(e) => e.tenant_id,
            InventoryEvent::StockConsumed(e) => e.tenant_id,
        }
    }

    pub fn item_id(&self) -> InventoryItemId {
        match self {
            InventoryEvent::ItemCreated(e) => e.item_id,
            InventoryEvent::StockRestocked(e) => e.item_id,
            InventoryEvent::StockConsumed(e) => e.item_id,
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::ItemCreated(e) => e.occurred_at,
            InventoryEvent::StockRestocked(e) => e.occurred_at,
            InventoryEvent::StockConsumed(e) => e.occurred_at,
        }
    }
}

impl Aggregate for InventoryItem {
    type Id = InventoryItemId;
    type Command = InventoryCommand;
    type Event = InventoryEvent;
    type Error = DomainError;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InventoryEvent::ItemCreated(e) => {
                self.id = e.item_id;
                self.tenant_id = Some(e.tenant_id);
                self.name = e.name.clone();
                self.category = e.category.clone();
                self.stock = e.initial_stock;
                self.min_threshold = e.min_threshold;
                self.expiration_date = e.expiration_date;
                self.batch_number = e.batch_number.clone();
                self.last_restocked = Some(e.occurred_at);
                self.created = true;
            }
            InventoryEvent::StockRestocked(e) => {
                self.stock = self.stock.saturating_add(e.quantity);
                self.last_restocked = Some(e.occurred_at);
                if e.expiration_date.is_some() {
                    self.expiration_date = e.expiration_date;
                }
                if e.batch_number.is_some() {
                    self.batch_number = e.batch_number.clone();
                }
            }
            InventoryEvent::StockConsumed(e) => {
                self.stock = self.stock.saturating_sub(e.quantity);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InventoryCommand::CreateItem(cmd) => self.handle_create(cmd),
            InventoryCommand::UpdateStock(cmd) => self.handle_update(cmd),
        }
    }
}

impl InventoryItem {
    fn ensure_target(&self, tenant_id: TenantId, item_id: InventoryItemId) -> Result<(), DomainError> {
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != item_id {
            return Err(DomainError::invariant("item_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateItem) -> Result<Vec<InventoryEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("item already exists"));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if cmd.initial_stock < 0 {
            return Err(DomainError::validation("initial stock cannot be negative"));
        }
        if cmd.min_threshold < 0 {
            return Err(DomainError::validation("minimum threshold cannot be negative"));
        }
        Ok(vec![InventoryEvent::ItemCreated(ItemCreated {
            tenant_id: cmd.tenant_id,
            item_id: cmd.item_id,
            name: cmd.name.clone(),
            category: cmd.category.clone(),
            initial_stock: cmd.initial_stock,
            min_threshold: cmd.min_threshold,
            expiration_date: cmd.expiration_date,
            batch_number: cmd.batch_number.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateStock) -> Result<Vec<InventoryEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_target(cmd.tenant_id, cmd.item_id)?;

        if cmd.quantity_change == 0 {
            return Err(DomainError::validation("quantity change cannot be zero"));
        }

        if cmd.quantity_change > 0 {
            if self.stock.checked_add(cmd.quantity_change).is_none() {
                return Err(DomainError::validation("stock overflow"));
            }
            return Ok(vec![InventoryEvent::StockRestocked(StockRestocked {
                tenant_id: cmd.tenant_id,
                item_id: cmd.item_id,
                quantity: cmd.quantity_change,
                expiration_date: cmd.expiration_date,
                batch_number: cmd.batch_number.clone(),
                occurred_at: cmd.occurred_at,
            })]);
        }

        if cmd.reason.trim().is_empty() {
            return Err(DomainError::validation("usage reason cannot be empty"));
        }

        let quantity = cmd.quantity_change.unsigned_abs();
        if quantity > self.stock.unsigned_abs() {
            return Err(DomainError::invariant("insufficient stock"));
        }

        Ok(vec![InventoryEvent::StockConsumed(StockConsumed {
            tenant_id: cmd.tenant_id,
            item_id: cmd.item_id,
            quantity: -cmd.quantity_change,
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
