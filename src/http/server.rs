//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wire the source adapter, sample log, and poller from config
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request metrics)
//! - Graceful shutdown on the lifecycle broadcast

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::alert::ThresholdSet;
use crate::config::{HubConfig, LogMode, SourceKind};
use crate::http::handlers;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::poll::{PollStatus, Poller};
use crate::sample::log::{MemoryLog, SampleLog, StoreLog};
use crate::source::{HttpSource, ReadingSource, SourceError, StoreSource, SyntheticSource};
use crate::store::{StoreClient, StoreError};

/// Range of the synthetic source's generated readings.
const SYNTHETIC_RANGE: (f64, f64) = (0.0, 100.0);

/// Errors wiring the hub from its configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("source setup failed: {0}")]
    Source(#[from] SourceError),
    #[error("store setup failed: {0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Config(String),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub log: Arc<dyn SampleLog>,
    pub status: Arc<PollStatus>,
    pub thresholds: Arc<ArcSwap<ThresholdSet>>,
    pub refresh_tx: mpsc::Sender<()>,
    /// Default snapshot bound for views.
    pub snapshot_limit: usize,
}

/// HTTP server for the hub API, owning the poller it feeds from.
pub struct HubServer {
    router: Router,
    poller: Poller,
    thresholds: Arc<ArcSwap<ThresholdSet>>,
}

impl HubServer {
    /// Wire the full pipeline from configuration: store client, source
    /// adapter, sample log, poller, and the API router over them.
    pub fn new(config: &HubConfig) -> Result<Self, BuildError> {
        // The store client is only built when a configured mode needs it.
        let store_client = if config.log.mode == LogMode::Store
            || matches!(config.source.kind, SourceKind::Store | SourceKind::Synthetic)
        {
            Some(StoreClient::new(&config.store)?)
        } else {
            None
        };

        let source: Arc<dyn ReadingSource> = match config.source.kind {
            SourceKind::Http => {
                let url = config.source.url.as_deref().ok_or_else(|| {
                    BuildError::Config("source.url is required when source.kind is \"http\"".into())
                })?;
                Arc::new(HttpSource::new(
                    url,
                    Duration::from_secs(config.source.timeout_secs),
                )?)
            }
            SourceKind::Store => Arc::new(StoreSource::new(
                require_store(&store_client)?,
                &config.source.path,
            )),
            SourceKind::Synthetic => Arc::new(SyntheticSource::new(
                require_store(&store_client)?,
                &config.source.synthetic_path,
                SYNTHETIC_RANGE.0,
                SYNTHETIC_RANGE.1,
            )),
        };

        let log: Arc<dyn SampleLog> = match config.log.mode {
            LogMode::Memory => {
                let capacity = (config.log.capacity > 0).then_some(config.log.capacity);
                Arc::new(MemoryLog::new(capacity))
            }
            LogMode::Store => Arc::new(StoreLog::new(
                require_store(&store_client)?,
                &config.store.history_root,
            )),
        };

        let thresholds = Arc::new(ArcSwap::from_pointee(config.thresholds));
        let status = Arc::new(PollStatus::new());
        let (refresh_tx, refresh_rx) = mpsc::channel(1);

        let poller = Poller::new(
            source,
            log.clone(),
            thresholds.clone(),
            config.poll.clone(),
            status.clone(),
            refresh_rx,
        );

        let state = AppState {
            log,
            status,
            thresholds: thresholds.clone(),
            refresh_tx,
            snapshot_limit: config.log.snapshot_limit,
        };
        let router = Self::build_router(config, state);

        Ok(Self {
            router,
            poller,
            thresholds,
        })
    }

    /// Handle to the live threshold set, for config hot-reload.
    pub fn thresholds(&self) -> Arc<ArcSwap<ThresholdSet>> {
        self.thresholds.clone()
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &HubConfig, state: AppState) -> Router {
        Router::new()
            .route("/healthz", get(handlers::healthz))
            .route("/api/latest", get(handlers::latest))
            .route("/api/series/{field}", get(handlers::series))
            .route("/api/samples", get(handlers::samples))
            .route("/api/history/dates", get(handlers::history_dates))
            .route("/api/history/{date}", get(handlers::history_on))
            .route("/api/export", get(handlers::export_today))
            .route("/api/export/{date}", get(handlers::export_on))
            .route("/api/refresh", post(handlers::refresh))
            .route("/api/reset", post(handlers::reset))
            .route(
                "/api/thresholds",
                get(handlers::thresholds).put(handlers::put_thresholds),
            )
            .route_layer(middleware::from_fn(track_requests))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.http.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the poller and the server until shutdown, accepting connections
    /// on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let Self { router, poller, .. } = self;

        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let poller_handle = tokio::spawn(poller.run(shutdown.subscribe()));

        let mut rx = shutdown.subscribe();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = rx.recv().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        let _ = poller_handle.await;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn require_store(client: &Option<StoreClient>) -> Result<StoreClient, BuildError> {
    client.clone().ok_or_else(|| {
        BuildError::Config("store.base_url is required by the configured modes".into())
    })
}

/// Count every API request by route pattern and status.
async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;
    metrics::record_api_request(&endpoint, response.status().as_u16());
    response
}
