//! Infrastructure layer: read models and background forecasting.

pub mod forecasting;
pub mod projections;
