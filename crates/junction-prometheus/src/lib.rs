//! Prometheus metrics backend for the junction controller.
//!
//! [`PrometheusMetrics`] implements [`junction_core::MetricsBackend`] and exposes the
//! controller's counters in Prometheus format.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use junction_core::Controller;
//! use junction_model::ControllerConfig;
//! use junction_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let builder = Controller::builder(ControllerConfig::default())
//!     .with_metrics(Arc::new(metrics.clone()));
//! # drop(builder);
//!
//! // Later, from a /metrics handler:
//! // let families = metrics.gather();
//! // prometheus::TextEncoder::new().encode(&families, &mut buffer)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `junction_units_enqueued_total{priority}` - Counter
//! - `junction_units_released_total{priority}` - Counter
//! - `junction_unit_wait_seconds{priority}` - Histogram
//! - `junction_queue_depth{priority}` - Gauge
//! - `junction_signal_open` - Gauge (1 while open)
//! - `junction_phase_transitions_total{phase}` - Counter
//! - `junction_observer_errors_total{observer, kind}` - Counter
//!
//! ## HTTP Server
//! This crate does not serve `/metrics`; encode [`PrometheusMetrics::gather`] from whatever
//! HTTP stack the application already runs.

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
