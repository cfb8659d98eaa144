//! API handlers: JSON and CSV projections of the sample log.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::alert::{self, Alert, ThresholdSet};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::poll::StatusReport;
use crate::sample::log::LogError;
use crate::sample::Sample;
use crate::view::{self, LatestSummary};

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The sample log (and behind it, the store) failed.
    #[error(transparent)]
    Log(#[from] LogError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Log(e) => {
                tracing::error!(error = %e, "Log operation failed");
                (StatusCode::BAD_GATEWAY, "STORE_UNAVAILABLE", e.to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

#[derive(Deserialize)]
pub struct SnapshotQuery {
    limit: Option<usize>,
}

/// Snapshot bound for a request: absent = configured default, 0 = all.
fn effective_limit(query: Option<usize>, default: usize) -> Option<usize> {
    match query {
        Some(0) => None,
        Some(n) => Some(n),
        None => Some(default),
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub poll: StatusReport,
}

pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        poll: state.status.report(),
    })
}

#[derive(Serialize)]
pub struct LatestResponse {
    /// `null` until the first successful poll.
    pub latest: Option<LatestSummary>,
    pub alerts: Vec<Alert>,
    pub thresholds: ThresholdSet,
}

pub async fn latest(State(state): State<AppState>) -> ApiResult<Json<LatestResponse>> {
    let snapshot = state.log.snapshot(Some(state.snapshot_limit)).await?;
    metrics::record_snapshot_size(snapshot.len());
    let thresholds = **state.thresholds.load();
    let alerts = snapshot
        .last()
        .map(|sample| alert::evaluate(sample, &thresholds))
        .unwrap_or_default();

    Ok(Json(LatestResponse {
        latest: view::latest_summary(&snapshot),
        alerts,
        thresholds,
    }))
}

#[derive(Serialize)]
pub struct SeriesResponse {
    pub field: String,
    pub points: Vec<(chrono::DateTime<Utc>, f64)>,
}

pub async fn series(
    State(state): State<AppState>,
    Path(field): Path<String>,
    Query(query): Query<SnapshotQuery>,
) -> ApiResult<Json<SeriesResponse>> {
    let limit = effective_limit(query.limit, state.snapshot_limit);
    let snapshot = state.log.snapshot(limit).await?;
    let points = view::series(&snapshot, &field);
    Ok(Json(SeriesResponse { field, points }))
}

pub async fn samples(
    State(state): State<AppState>,
    Query(query): Query<SnapshotQuery>,
) -> ApiResult<Json<Vec<Sample>>> {
    let limit = effective_limit(query.limit, state.snapshot_limit);
    Ok(Json(state.log.snapshot(limit).await?))
}

pub async fn history_dates(State(state): State<AppState>) -> ApiResult<Json<Vec<NaiveDate>>> {
    Ok(Json(state.log.dates().await?))
}

pub async fn history_on(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> ApiResult<Json<Vec<Sample>>> {
    Ok(Json(state.log.snapshot_on(date).await?))
}

pub async fn export_today(State(state): State<AppState>) -> ApiResult<Response> {
    let today = Utc::now().date_naive();
    let label = if state.log.durable() {
        today.to_string()
    } else {
        format!("session_{today}")
    };
    let snapshot = state.log.snapshot(None).await?;
    Ok(csv_response(&snapshot, &label))
}

pub async fn export_on(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> ApiResult<Response> {
    let snapshot = state.log.snapshot_on(date).await?;
    Ok(csv_response(&snapshot, &date.to_string()))
}

fn csv_response(snapshot: &[Sample], label: &str) -> Response {
    let body = view::export_csv(snapshot);
    let disposition = format!("attachment; filename=\"{}\"", view::csv_filename(label));
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

pub async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    // Full channel means a refresh is already pending; both cases are a
    // scheduled cycle from the caller's point of view.
    if let Err(e) = state.refresh_tx.try_send(()) {
        tracing::debug!(reason = %e, "Refresh request coalesced");
    }
    (StatusCode::ACCEPTED, Json(json!({ "status": "scheduled" })))
}

pub async fn reset(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    state.log.reset().await?;
    tracing::info!("Sample log cleared by API request");
    Ok(Json(json!({ "status": "cleared" })))
}

pub async fn thresholds(State(state): State<AppState>) -> Json<ThresholdSet> {
    Json(**state.thresholds.load())
}

pub async fn put_thresholds(
    State(state): State<AppState>,
    Json(new): Json<ThresholdSet>,
) -> ApiResult<Json<ThresholdSet>> {
    for (field, limit) in new.limits() {
        if let Some(limit) = limit {
            if !limit.is_finite() {
                return Err(ApiError::BadRequest(format!(
                    "threshold {field} must be a finite number"
                )));
            }
        }
    }

    state.thresholds.store(Arc::new(new));
    tracing::info!("Thresholds replaced by API request");
    Ok(Json(new))
}
