//! `clinic-core`: shared building blocks for the clinic operations workspace.
//!
//! Identifiers, the domain error model and the aggregate contract. No IO lives here.

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::Aggregate;
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, TenantId};
