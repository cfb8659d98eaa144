//! Environmental sensor hub daemon.
//!
//! ```text
//!                    ┌──────────────────────────────┐
//!                    │          enviro-hub          │
//!                    │                              │
//!   sensor endpoint ─┤→ source ─→ poller ─→ log ────┤→ HTTP API
//!   or JSON store    │              │               │   /api/latest
//!                    │         thresholds           │   /api/series/{field}
//!                    │              │               │   /api/export
//!                    │           alerts             │   ...
//!                    └──────────────────────────────┘
//! ```
//!
//! The poller fetches one reading per interval from the configured source,
//! appends it to the sample log, and evaluates thresholds. The HTTP API
//! serves rolling views over the log.

use std::sync::Arc;

use enviro_hub::config::{self, watcher::ConfigWatcher};
use enviro_hub::lifecycle::signals;
use enviro_hub::observability::{logging, metrics};
use enviro_hub::{HubServer, Shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("HUB_CONFIG").ok())
        .ok_or("no configuration given (pass a path or set HUB_CONFIG)")?;

    let config = config::load_config(std::path::Path::new(&config_path))?;

    logging::init(&config.observability.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path,
        "Starting enviro-hub"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!("Invalid metrics address, metrics disabled: {}", e),
        }
    }

    let server = HubServer::new(&config)?;
    let shutdown = Arc::new(Shutdown::new());

    // Threshold changes apply without a restart; other sections need one.
    let thresholds = server.thresholds();
    let (watcher, mut updates) = ConfigWatcher::new(std::path::Path::new(&config_path));
    let mut _watcher_guard = None;
    match watcher.run() {
        Ok(guard) => {
            tokio::spawn(async move {
                while let Some(new_config) = updates.recv().await {
                    tracing::info!("Applying updated thresholds from configuration");
                    thresholds.store(Arc::new(new_config.thresholds));
                }
            });
            _watcher_guard = Some(guard);
        }
        Err(e) => {
            tracing::warn!("Config watcher failed to start, hot reload disabled: {}", e);
        }
    }

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::listen(&signal_shutdown).await;
    });

    let listener = tokio::net::TcpListener::bind(&config.http.bind_address).await?;
    server.run(listener, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
