//! HTTP reading source: GET an endpoint that answers with a JSON object.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use reqwest::Url;
use serde_json::Value;

use crate::sample::Sample;
use crate::source::{ReadingSource, SourceError};

pub struct HttpSource {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpSource {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, SourceError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| SourceError::Unavailable(format!("invalid endpoint {endpoint}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Unavailable(format!("client build failed: {e}")))?;
        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl ReadingSource for HttpSource {
    async fn fetch(&self) -> Result<Sample, SourceError> {
        let response = match self.http.get(self.endpoint.clone()).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Err(SourceError::Unavailable("request timed out".to_string()));
            }
            Err(e) => {
                return Err(SourceError::Unavailable(format!("connection error: {e}")));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Unavailable(format!(
                "non-success status {status}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| SourceError::MalformedPayload(format!("invalid JSON body: {e}")))?;

        Sample::from_payload(&payload, Utc::now().trunc_subsecs(0))
            .map_err(|e| SourceError::MalformedPayload(e.to_string()))
    }

    fn label(&self) -> &'static str {
        "http"
    }
}
