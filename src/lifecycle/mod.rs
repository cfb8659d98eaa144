//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Initialize subsystems → Start poller + server
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Poller exits after current cycle → Server drains
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listeners
//! - In-flight poll cycles finish on their own; nothing is aborted

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
