//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request lifecycle events
//!     → logging.rs (tracing events, EnvFilter + fmt)
//!     → metrics.rs (counters, histograms → Prometheus exporter)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event, message last
//! - Metrics are optional and off unless an address is configured

pub mod logging;
pub mod metrics;
