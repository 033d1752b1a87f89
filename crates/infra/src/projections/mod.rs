//! Projection implementations (read model builders).
//!
//! Projections consume inventory events and build the read models the
//! forecasting engine queries. All projections are:
//! - **Rebuildable**: Can be reconstructed from the event stream
//! - **Tenant-isolated**: Data is partitioned by tenant
//! - **Idempotent**: Safe for at-least-once delivery

pub mod forecast_inputs;

pub use forecast_inputs::{ForecastInputsProjection, ProjectionError, StreamedEvent};
