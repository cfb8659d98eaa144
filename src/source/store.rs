//! Store reading source: read the device's "current reading" node from the
//! remote store instead of talking to the device directly.

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use serde_json::Value;

use crate::sample::Sample;
use crate::source::{ReadingSource, SourceError};
use crate::store::{StoreClient, StoreError};

pub struct StoreSource {
    client: StoreClient,
    /// Store path of the node the device publishes its latest reading to.
    node: String,
}

impl StoreSource {
    pub fn new(client: StoreClient, node: impl Into<String>) -> Self {
        Self {
            client,
            node: node.into(),
        }
    }
}

#[async_trait]
impl ReadingSource for StoreSource {
    async fn fetch(&self) -> Result<Sample, SourceError> {
        let payload = self.client.get(&self.node).await.map_err(|e| match e {
            StoreError::Decode(reason) => SourceError::MalformedPayload(reason),
            other => SourceError::Unavailable(other.to_string()),
        })?;

        if payload.is_null() {
            return Err(SourceError::Unavailable(format!(
                "no reading at node {}",
                self.node
            )));
        }

        Sample::from_payload(&payload, Utc::now().trunc_subsecs(0))
            .map_err(|e| SourceError::MalformedPayload(e.to_string()))
    }

    fn label(&self) -> &'static str {
        "store"
    }
}
