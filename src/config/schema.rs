//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the hub.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::alert::ThresholdSet;

/// Root configuration for the telemetry hub.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HubConfig {
    /// API server configuration (bind address, timeouts).
    pub http: HttpConfig,

    /// Where samples come from.
    pub source: SourceConfig,

    /// Remote JSON tree store connection.
    pub store: StoreConfig,

    /// Sample log lifecycle and bounds.
    pub log: LogConfig,

    /// Poll loop cadence and write verification.
    pub poll: PollConfig,

    /// Per-field alert limits, adjustable at runtime.
    pub thresholds: ThresholdSet,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// API server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Which adapter produces samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// GET a device endpoint that answers with a JSON object.
    Http,
    /// Read the device's latest-reading node from the remote store.
    Store,
    /// Generate random readings (demos, soak tests).
    Synthetic,
}

/// Reading source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Adapter kind.
    pub kind: SourceKind,

    /// Device endpoint URL (required for `kind = "http"`).
    pub url: Option<String>,

    /// Store path of the latest-reading node (`kind = "store"`).
    pub path: String,

    /// Fetch timeout in seconds.
    pub timeout_secs: u64,

    /// Store path synthetic readings are published to (`kind = "synthetic"`).
    pub synthetic_path: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Http,
            url: None,
            path: "sensors".to_string(),
            timeout_secs: 3,
            synthetic_path: "selftest".to_string(),
        }
    }
}

/// Remote JSON tree store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store base URL (e.g., "http://127.0.0.1:9000/").
    pub base_url: String,

    /// Root node the per-day history partitions live under.
    pub history_root: String,

    /// Store request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            history_root: "history".to_string(),
            request_timeout_secs: 5,
        }
    }
}

/// Sample log lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogMode {
    /// Session-scoped, held in process memory.
    Memory,
    /// Durable, materialized by the remote store.
    Store,
}

/// Sample log configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log lifecycle.
    pub mode: LogMode,

    /// Rolling-window capacity for the memory log (0 = unbounded).
    pub capacity: usize,

    /// Default snapshot bound for views (newest N samples).
    pub snapshot_limit: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            mode: LogMode::Memory,
            capacity: 0,
            snapshot_limit: 50,
        }
    }
}

/// Poll loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollConfig {
    /// Fixed poll interval in seconds.
    pub interval_secs: u64,

    /// Verify durable appends with a follow-up read.
    pub verify_writes: bool,

    /// Verification read attempts before giving up.
    pub verify_attempts: u32,

    /// Delay between verification attempts in milliseconds.
    pub verify_delay_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            verify_writes: true,
            verify_attempts: 3,
            verify_delay_ms: 200,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
