//! Clinic inventory domain module (event-sourced).
//!
//! Business rules for consumable supplies (vaccines, medication, surgical
//! stock). Deterministic domain logic only: no IO, no HTTP, no storage.
//! Every stock decrement produces a `StockConsumed` event; those events are the
//! usage history the forecasting engine reads.

pub mod item;

pub use item::{
    CreateItem, InventoryCommand, InventoryEvent, InventoryItem, InventoryItemId, ItemCreated,
    StockConsumed, StockRestocked, UpdateStock,
};
