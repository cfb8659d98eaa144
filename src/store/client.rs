//! Thin client for a path-addressed remote JSON tree store.
//!
//! Speaks plain HTTP: `GET`/`POST`/`DELETE` against `<base>/<path>`, with
//! `?order_by=&limit_to_last=` for bounded list reads and `?shallow=true`
//! for key listings. Hosted realtime databases expose this surface; the
//! hub treats whatever is behind it as opaque.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::StoreConfig;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection, timeout or protocol failure.
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("store returned status {0}")]
    Status(reqwest::StatusCode),

    /// The response body was not valid JSON.
    #[error("store response was not valid JSON: {0}")]
    Decode(String),

    /// The configured base URL or a derived node path is unusable.
    #[error("invalid store URL: {0}")]
    Url(String),
}

/// Client handle for one store. Cheap to clone; created once at startup
/// and passed explicitly to whoever needs store access.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base: Url,
}

impl StoreClient {
    /// Build a client from configuration. Fails fast on an unparseable
    /// base URL; requests carry the configured timeout.
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut base =
            Url::parse(&config.base_url).map_err(|e| StoreError::Url(e.to_string()))?;
        // Url::join treats a missing trailing slash as a file component.
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { http, base })
    }

    fn node_url(&self, path: &str) -> Result<Url, StoreError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| StoreError::Url(format!("{path}: {e}")))
    }

    /// Read the JSON value at `path`. An absent node reads as `Null`.
    pub async fn get(&self, path: &str) -> Result<Value, StoreError> {
        let response = self.http.get(self.node_url(path)?).send().await?;
        decode(response).await
    }

    /// Append a record under `path`; the store assigns the child key.
    pub async fn add(&self, path: &str, record: &Value) -> Result<(), StoreError> {
        let response = self
            .http
            .post(self.node_url(path)?)
            .json(record)
            .send()
            .await?;
        decode(response).await.map(|_| ())
    }

    /// List the records held under `path`, optionally bounded to the last
    /// `n` in store order. Returns record values only; chronological
    /// ordering is the caller's job, store key order means nothing.
    pub async fn list(&self, path: &str, last_n: Option<usize>) -> Result<Vec<Value>, StoreError> {
        let mut request = self.http.get(self.node_url(path)?);
        if let Some(n) = last_n {
            request = request.query(&[
                ("order_by", "timestamp".to_string()),
                ("limit_to_last", n.to_string()),
            ]);
        }
        let value = decode(request.send().await?).await?;

        let records = match value {
            Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
            Value::Array(items) => items.into_iter().filter(|v| !v.is_null()).collect(),
            Value::Null => Vec::new(),
            other => {
                return Err(StoreError::Decode(format!(
                    "expected a collection, got {other}"
                )))
            }
        };
        Ok(records)
    }

    /// List the child keys under `path` without their values.
    pub async fn keys(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let request = self
            .http
            .get(self.node_url(path)?)
            .query(&[("shallow", "true")]);
        let value = decode(request.send().await?).await?;

        match value {
            Value::Object(map) => Ok(map.into_iter().map(|(k, _)| k).collect()),
            Value::Null => Ok(Vec::new()),
            other => Err(StoreError::Decode(format!(
                "expected a key map, got {other}"
            ))),
        }
    }

    /// Delete the subtree at `path`. Deleting an absent node succeeds.
    pub async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let response = self.http.delete(self.node_url(path)?).send().await?;
        if !response.status().is_success() {
            return Err(StoreError::Status(response.status()));
        }
        Ok(())
    }
}

async fn decode(response: reqwest::Response) -> Result<Value, StoreError> {
    if !response.status().is_success() {
        return Err(StoreError::Status(response.status()));
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| StoreError::Decode(e.to_string()))
}
