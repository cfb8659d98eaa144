//! Environmental Telemetry Hub Library

pub mod alert;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod poll;
pub mod sample;
pub mod source;
pub mod store;
pub mod view;

pub use config::schema::HubConfig;
pub use http::HubServer;
pub use lifecycle::Shutdown;
