//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (tracing events: skip decisions, sink and notifier failures)
//!     → metrics.rs (counters for lines, skips, flushes, error reports)
//!
//! Consumers:
//!     → stderr via tracing-subscriber (filtered by RUST_LOG or config)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Diagnostic logging is separate from the access log itself
//! - Metrics are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
