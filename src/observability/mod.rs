//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, file, remote)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Poll-cycle failures are warnings with structured fields, never fatal
//! - Metrics are cheap (atomic increments)
//! - RUST_LOG overrides the configured log level

pub mod logging;
pub mod metrics;
