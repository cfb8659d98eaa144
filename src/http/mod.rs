//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! dashboard / hub-cli request
//!     → server.rs (Axum setup, timeout + trace layers)
//!     → handlers.rs (project a log snapshot into the response)
//!     → JSON or CSV back to the caller
//! ```
//!
//! # Design Decisions
//! - Handlers never hold state between requests; every response is a
//!   fresh projection of a log snapshot
//! - An empty log is a 200 with an empty/null payload, never an error

pub mod handlers;
pub mod server;

pub use server::{AppState, HubServer};
