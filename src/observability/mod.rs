//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! controller, bridge, view:
//!     → logging.rs (structured tracing events, stderr)
//!     → metrics.rs (counters and gauges, optional Prometheus endpoint)
//! ```
//!
//! # Design Decisions
//! - Structured fields (topic, attempt, error) instead of formatted strings
//! - Never log the project id

pub mod logging;
pub mod metrics;
