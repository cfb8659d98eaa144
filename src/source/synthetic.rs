//! Synthetic reading source for demos and soak tests: no hardware, just a
//! random value per fetch, published to the store the way a device would
//! publish its own.

use std::collections::BTreeMap;

use async_trait::async_trait;
use rand::Rng;

use crate::sample::Sample;
use crate::source::{ReadingSource, SourceError};
use crate::store::StoreClient;

pub struct SyntheticSource {
    low: f64,
    high: f64,
    client: StoreClient,
    /// Store node generated readings are published to.
    node: String,
}

impl SyntheticSource {
    pub fn new(client: StoreClient, node: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            low,
            high,
            client,
            node: node.into(),
        }
    }

    fn generate(&self) -> f64 {
        let mut rng = rand::thread_rng();
        (rng.gen_range(self.low..=self.high) * 100.0).round() / 100.0
    }
}

#[async_trait]
impl ReadingSource for SyntheticSource {
    async fn fetch(&self) -> Result<Sample, SourceError> {
        let mut fields = BTreeMap::new();
        fields.insert("value".to_string(), self.generate());
        let sample = Sample::now(fields);

        self.client
            .add(&self.node, &sample.to_record())
            .await
            .map_err(|e| SourceError::Unavailable(format!("publish failed: {e}")))?;

        Ok(sample)
    }

    fn label(&self) -> &'static str {
        "synthetic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;

    #[test]
    fn test_generated_value_stays_in_range() {
        let client = StoreClient::new(&StoreConfig {
            base_url: "http://127.0.0.1:1/".to_string(),
            history_root: "history".to_string(),
            request_timeout_secs: 1,
        })
        .unwrap();
        let source = SyntheticSource::new(client, "selftest", 10.0, 20.0);
        for _ in 0..20 {
            let value = source.generate();
            assert!((10.0..=20.0).contains(&value), "value {value} out of range");
        }
    }
}
