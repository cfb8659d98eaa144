//! Poll loop: the single task that turns a reading source into a log.
//!
//! # Data Flow
//! ```text
//! interval tick ─┐
//!                ├─→ fetch → append → verify (durable) → evaluate → status
//! manual refresh ┘
//! ```
//!
//! # Design Decisions
//! - At most one fetch in flight: the cycle is awaited inline and the
//!   ticker skips missed ticks instead of bunching them
//! - Refresh requests arriving mid-cycle are coalesced, never queued
//! - Every failure is cycle-local: warn, count, wait for the next tick

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::alert::{self, ThresholdSet};
use crate::config::PollConfig;
use crate::observability::metrics;
use crate::sample::log::SampleLog;
use crate::sample::Sample;
use crate::source::ReadingSource;

/// Verification reads only need to see the newest few entries.
const VERIFY_WINDOW: usize = 10;

/// Shared, lock-light view of how polling is going. Handlers read it for
/// liveness reporting; only the poller writes it.
pub struct PollStatus {
    started_at: DateTime<Utc>,
    cycles: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    consecutive_failures: AtomicU64,
    last: RwLock<LastOutcome>,
}

#[derive(Default)]
struct LastOutcome {
    success_at: Option<DateTime<Utc>>,
    error: Option<String>,
}

/// Point-in-time copy of the poll status for the API.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub uptime_secs: i64,
    pub cycles: u64,
    pub successes: u64,
    pub failures: u64,
    pub consecutive_failures: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl PollStatus {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            cycles: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            consecutive_failures: AtomicU64::new(0),
            last: RwLock::new(LastOutcome::default()),
        }
    }

    fn record_success(&self, at: DateTime<Utc>) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.successes.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);
        let mut last = self.last.write().expect("poll status lock poisoned");
        last.success_at = Some(at);
    }

    fn record_failure(&self, error: String) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
        let mut last = self.last.write().expect("poll status lock poisoned");
        last.error = Some(error);
    }

    pub fn report(&self) -> StatusReport {
        let last = self.last.read().expect("poll status lock poisoned");
        StatusReport {
            uptime_secs: (Utc::now() - self.started_at).num_seconds(),
            cycles: self.cycles.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
            last_success: last.success_at,
            last_error: last.error.clone(),
        }
    }
}

impl Default for PollStatus {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Poller {
    source: Arc<dyn ReadingSource>,
    log: Arc<dyn SampleLog>,
    thresholds: Arc<ArcSwap<ThresholdSet>>,
    config: PollConfig,
    status: Arc<PollStatus>,
    refresh_rx: mpsc::Receiver<()>,
}

impl Poller {
    pub fn new(
        source: Arc<dyn ReadingSource>,
        log: Arc<dyn SampleLog>,
        thresholds: Arc<ArcSwap<ThresholdSet>>,
        config: PollConfig,
        status: Arc<PollStatus>,
        refresh_rx: mpsc::Receiver<()>,
    ) -> Self {
        Self {
            source,
            log,
            thresholds,
            config,
            status,
            refresh_rx,
        }
    }

    /// Run until shutdown. The first tick fires immediately, so the log
    /// has data as soon as the source answers once.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval = self.config.interval_secs,
            source = self.source.label(),
            durable = self.log.durable(),
            "Poller starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.cycle("tick").await;
                }
                Some(()) = self.refresh_rx.recv() => {
                    self.cycle("refresh").await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Poller received shutdown signal, exiting loop");
                    break;
                }
            }
            // Refresh requests that piled up while the cycle ran are
            // already satisfied by it.
            while self.refresh_rx.try_recv().is_ok() {}
        }
    }

    async fn cycle(&self, trigger: &'static str) {
        let started = Instant::now();
        let fetched = self.source.fetch().await;
        metrics::record_fetch_duration(started.elapsed().as_secs_f64());

        let sample = match fetched {
            Ok(sample) => sample,
            Err(e) => {
                metrics::record_source_failure(e.kind());
                metrics::record_cycle("failure");
                self.status.record_failure(e.to_string());
                tracing::warn!(trigger, kind = e.kind(), error = %e, "Fetch failed, skipping cycle");
                return;
            }
        };

        if let Err(e) = self.log.append(sample.clone()).await {
            metrics::record_cycle("failure");
            self.status.record_failure(e.to_string());
            tracing::warn!(trigger, error = %e, "Append failed, dropping sample");
            return;
        }
        metrics::record_append();

        if self.log.durable() && self.config.verify_writes {
            self.verify_append(&sample).await;
        }

        let thresholds = self.thresholds.load();
        let alerts = alert::evaluate(&sample, &thresholds);
        metrics::record_active_alerts(alerts.len());
        for alert in &alerts {
            tracing::warn!(
                field = %alert.field,
                value = alert.value,
                limit = alert.limit,
                "Threshold exceeded"
            );
        }

        metrics::record_cycle("success");
        self.status.record_success(sample.timestamp);
        tracing::debug!(
            trigger,
            timestamp = %sample.timestamp,
            alerts = alerts.len(),
            "Poll cycle complete"
        );
    }

    /// Confirm a durable append became visible, retrying briefly. Exhausting
    /// the attempts is logged and tolerated; the next snapshot will tell.
    async fn verify_append(&self, sample: &Sample) {
        let delay = Duration::from_millis(self.config.verify_delay_ms);
        for attempt in 1..=self.config.verify_attempts {
            match self.log.snapshot(Some(VERIFY_WINDOW)).await {
                Ok(snapshot) if snapshot.iter().any(|s| s.timestamp == sample.timestamp) => {
                    tracing::debug!(attempt, "Append verified");
                    return;
                }
                Ok(_) => {
                    tracing::debug!(attempt, "Append not visible yet");
                }
                Err(e) => {
                    tracing::debug!(attempt, error = %e, "Verification read failed");
                }
            }
            if attempt < self.config.verify_attempts {
                time::sleep(delay).await;
            }
        }
        tracing::warn!(
            timestamp = %sample.timestamp,
            attempts = self.config.verify_attempts,
            "Append verification gave up"
        );
    }
}
