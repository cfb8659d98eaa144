//! Sample log: the ordered history of samples.
//!
//! # Responsibilities
//! - Append-only log of samples for the session or day
//! - Snapshots sorted by timestamp, optionally bounded to a suffix
//! - Filter malformed store entries before anything downstream sees them
//!
//! # Design Decisions
//! - Two lifecycles: session-scoped in memory, or durable in the remote
//!   store under one partition per UTC day
//! - The durable log is a read of the store's current state, never a local
//!   cache: it can shrink or jump under concurrent writers
//! - A bounded store read that comes back empty falls back to an unbounded
//!   read (defensive; some stores return empty for ordered queries before
//!   indexes warm up)

use std::collections::VecDeque;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use thiserror::Error;

use crate::sample::{sort_chronologically, Sample};
use crate::store::{StoreClient, StoreError};

/// Errors from log operations. The in-memory variant never fails.
#[derive(Debug, Error)]
pub enum LogError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The ordered history of samples.
///
/// `snapshot` is the basis for all downstream rendering: always sorted
/// non-decreasing by timestamp, never containing unparseable entries.
#[async_trait]
pub trait SampleLog: Send + Sync {
    /// Append one sample. O(1) amortized for the in-memory variant.
    async fn append(&self, sample: Sample) -> Result<(), LogError>;

    /// Sorted copy of today's (or the session's) samples; `limit` keeps
    /// only the newest entries.
    async fn snapshot(&self, limit: Option<usize>) -> Result<Vec<Sample>, LogError>;

    /// Sorted samples for one calendar date.
    async fn snapshot_on(&self, date: NaiveDate) -> Result<Vec<Sample>, LogError>;

    /// Dates with recorded samples, ascending.
    async fn dates(&self) -> Result<Vec<NaiveDate>, LogError>;

    /// Clear today's partition (durable) or the whole session (memory).
    async fn reset(&self) -> Result<(), LogError>;

    /// Whether appends land in the remote store. Durable appends are
    /// followed by a verification read in the poll loop.
    fn durable(&self) -> bool {
        false
    }
}

/// Session-scoped log held in process memory; resets with the process.
pub struct MemoryLog {
    samples: RwLock<VecDeque<Sample>>,
    /// Rolling-window capacity; `None` keeps the whole session.
    capacity: Option<usize>,
}

impl MemoryLog {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            samples: RwLock::new(VecDeque::new()),
            capacity,
        }
    }

    fn sorted(&self, mut samples: Vec<Sample>, limit: Option<usize>) -> Vec<Sample> {
        sort_chronologically(&mut samples);
        if let Some(limit) = limit {
            if samples.len() > limit {
                samples.drain(..samples.len() - limit);
            }
        }
        samples
    }
}

#[async_trait]
impl SampleLog for MemoryLog {
    async fn append(&self, sample: Sample) -> Result<(), LogError> {
        let mut samples = self.samples.write().expect("sample log lock poisoned");
        samples.push_back(sample);
        if let Some(capacity) = self.capacity {
            while samples.len() > capacity {
                samples.pop_front();
            }
        }
        Ok(())
    }

    async fn snapshot(&self, limit: Option<usize>) -> Result<Vec<Sample>, LogError> {
        let samples = self.samples.read().expect("sample log lock poisoned");
        Ok(self.sorted(samples.iter().cloned().collect(), limit))
    }

    async fn snapshot_on(&self, date: NaiveDate) -> Result<Vec<Sample>, LogError> {
        let samples = self.samples.read().expect("sample log lock poisoned");
        let matching = samples
            .iter()
            .filter(|sample| sample.date() == date)
            .cloned()
            .collect();
        Ok(self.sorted(matching, None))
    }

    async fn dates(&self) -> Result<Vec<NaiveDate>, LogError> {
        let samples = self.samples.read().expect("sample log lock poisoned");
        let mut dates: Vec<NaiveDate> = samples.iter().map(Sample::date).collect();
        dates.sort_unstable();
        dates.dedup();
        Ok(dates)
    }

    async fn reset(&self) -> Result<(), LogError> {
        self.samples
            .write()
            .expect("sample log lock poisoned")
            .clear();
        Ok(())
    }
}

/// Durable log materialized by the remote store, one partition per UTC day
/// (`<history_root>/<YYYY-MM-DD>`). Every snapshot re-reads the store.
pub struct StoreLog {
    client: StoreClient,
    history_root: String,
}

impl StoreLog {
    pub fn new(client: StoreClient, history_root: impl Into<String>) -> Self {
        Self {
            client,
            history_root: history_root.into(),
        }
    }

    fn partition(&self, date: NaiveDate) -> String {
        format!("{}/{}", self.history_root, date.format("%Y-%m-%d"))
    }

    /// Read a partition and keep only well-formed entries, sorted.
    async fn read_partition(
        &self,
        date: NaiveDate,
        limit: Option<usize>,
    ) -> Result<Vec<Sample>, LogError> {
        let path = self.partition(date);
        let mut records = self.client.list(&path, limit).await?;

        if records.is_empty() && limit.is_some() {
            tracing::debug!(path = %path, "Bounded read came back empty, retrying unbounded");
            records = self.client.list(&path, None).await?;
        }

        let total = records.len();
        let mut samples: Vec<Sample> = records
            .iter()
            .filter_map(Sample::from_record)
            .collect();
        if samples.len() < total {
            tracing::warn!(
                path = %path,
                dropped = total - samples.len(),
                "Dropped malformed store entries from snapshot"
            );
        }

        sort_chronologically(&mut samples);
        if let Some(limit) = limit {
            if samples.len() > limit {
                samples.drain(..samples.len() - limit);
            }
        }
        Ok(samples)
    }
}

#[async_trait]
impl SampleLog for StoreLog {
    async fn append(&self, sample: Sample) -> Result<(), LogError> {
        let path = self.partition(sample.date());
        self.client.add(&path, &sample.to_record()).await?;
        Ok(())
    }

    async fn snapshot(&self, limit: Option<usize>) -> Result<Vec<Sample>, LogError> {
        self.read_partition(Utc::now().date_naive(), limit).await
    }

    async fn snapshot_on(&self, date: NaiveDate) -> Result<Vec<Sample>, LogError> {
        self.read_partition(date, None).await
    }

    async fn dates(&self) -> Result<Vec<NaiveDate>, LogError> {
        let keys = self.client.keys(&self.history_root).await?;
        let mut dates: Vec<NaiveDate> = keys
            .iter()
            .filter_map(|key| NaiveDate::parse_from_str(key, "%Y-%m-%d").ok())
            .collect();
        dates.sort_unstable();
        Ok(dates)
    }

    async fn reset(&self) -> Result<(), LogError> {
        let path = self.partition(Utc::now().date_naive());
        self.client.delete(&path).await?;
        Ok(())
    }

    fn durable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn sample_at(secs: i64, temp: f64) -> Sample {
        let mut fields = BTreeMap::new();
        fields.insert("temp".to_string(), temp);
        Sample {
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            fields,
            status: None,
            action: None,
        }
    }

    #[tokio::test]
    async fn test_memory_snapshot_sorts_out_of_order_appends() {
        let log = MemoryLog::new(None);
        log.append(sample_at(300, 3.0)).await.unwrap();
        log.append(sample_at(100, 1.0)).await.unwrap();
        log.append(sample_at(200, 2.0)).await.unwrap();

        let snapshot = log.snapshot(None).await.unwrap();
        let stamps: Vec<i64> = snapshot.iter().map(|s| s.timestamp.timestamp()).collect();
        assert_eq!(stamps, vec![100, 200, 300]);
    }

    #[tokio::test]
    async fn test_memory_rolling_window_drops_oldest() {
        let log = MemoryLog::new(Some(2));
        for secs in [10, 20, 30] {
            log.append(sample_at(secs, secs as f64)).await.unwrap();
        }

        let snapshot = log.snapshot(None).await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].timestamp.timestamp(), 20);
        assert_eq!(snapshot[1].timestamp.timestamp(), 30);
    }

    #[tokio::test]
    async fn test_memory_snapshot_limit_keeps_newest() {
        let log = MemoryLog::new(None);
        for secs in [10, 20, 30, 40] {
            log.append(sample_at(secs, 0.0)).await.unwrap();
        }

        let snapshot = log.snapshot(Some(2)).await.unwrap();
        let stamps: Vec<i64> = snapshot.iter().map(|s| s.timestamp.timestamp()).collect();
        assert_eq!(stamps, vec![30, 40]);
    }

    #[tokio::test]
    async fn test_memory_reset_and_dates() {
        let log = MemoryLog::new(None);
        // Two samples a day apart.
        log.append(sample_at(0, 1.0)).await.unwrap();
        log.append(sample_at(86_400, 2.0)).await.unwrap();

        let dates = log.dates().await.unwrap();
        assert_eq!(dates.len(), 2);

        let first_day = log.snapshot_on(dates[0]).await.unwrap();
        assert_eq!(first_day.len(), 1);
        assert_eq!(first_day[0].fields.get("temp"), Some(&1.0));

        log.reset().await.unwrap();
        assert!(log.snapshot(None).await.unwrap().is_empty());
        assert!(!log.durable());
    }

    #[test]
    fn test_store_partition_naming() {
        let client = StoreClient::new(&crate::config::StoreConfig {
            base_url: "http://store.local/".to_string(),
            history_root: "history".to_string(),
            request_timeout_secs: 5,
        })
        .unwrap();
        let log = StoreLog::new(client, "history");
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(log.partition(date), "history/2025-03-14");
        assert!(log.durable());
    }
}
