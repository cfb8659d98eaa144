//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → HubConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//!
//! On reload signal:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → threshold set swapped atomically (arc-swap)
//!     → other sections require restart
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only thresholds hot-reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::HubConfig;
pub use schema::LogMode;
pub use schema::PollConfig;
pub use schema::SourceKind;
pub use schema::StoreConfig;
