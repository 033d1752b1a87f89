//! Forecast orchestration adapters.
//!
//! Recompute usage forecasts on a schedule or after projection updates.
//! Failures are isolated and never reach the inventory write path.

pub mod forecast_runner;

pub use forecast_runner::{ForecastRunner, ForecastRunnerHandle, ForecastSink, InMemoryForecastSink};
