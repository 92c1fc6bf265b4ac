//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms via `metrics`)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Topic and URL travel as structured fields, not in the message text
//! - Metric labels stay low-cardinality (no per-topic labels)
//! - Metric calls are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
