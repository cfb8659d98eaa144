//! Remote store access subsystem.
//!
//! # Data Flow
//! ```text
//! StoreSource / SyntheticSource / StoreLog
//!     → client.rs (path-addressed JSON reads, appends, deletes)
//!     → remote JSON tree store (opaque collaborator)
//! ```
//!
//! # Design Decisions
//! - The store is a black box: the hub only reads what it currently
//!   reports and never caches store state locally
//! - Bounded reads are preferred; callers decide on fallbacks
//! - All requests carry an explicit timeout

pub mod client;

pub use client::{StoreClient, StoreError};
