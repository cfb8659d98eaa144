//! Reading sources: where samples come from.
//!
//! # Responsibilities
//! - One fetch = one sample attempt against the configured source
//! - Classify failures as unavailable (nothing arrived) or malformed
//!   (something arrived but could not be decoded)
//!
//! # Design Decisions
//! - Sources are interchangeable behind [`ReadingSource`]; the poll loop
//!   and handlers never know which variant is wired in
//! - A fetch failure is cycle-local: callers log it and move on, nothing
//!   here retries

pub mod http;
pub mod store;
pub mod synthetic;

pub use http::HttpSource;
pub use store::StoreSource;
pub use synthetic::SyntheticSource;

use async_trait::async_trait;
use thiserror::Error;

use crate::sample::Sample;

/// Why a fetch produced no sample.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source could not be reached or returned no reading.
    #[error("Source unavailable: {0}")]
    Unavailable(String),
    /// The source answered but the payload could not be decoded.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl SourceError {
    /// Stable label for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Unavailable(_) => "unavailable",
            SourceError::MalformedPayload(_) => "malformed",
        }
    }
}

/// A single upstream producing samples on demand.
#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// Fetch the current reading. Exactly one sample per successful call.
    async fn fetch(&self) -> Result<Sample, SourceError>;

    /// Short label for logs ("http", "store", "synthetic").
    fn label(&self) -> &'static str;
}
