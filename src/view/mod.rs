//! Presentation projections over a snapshot.
//!
//! # Responsibilities
//! - Latest-summary, per-field series, and CSV views of a sorted snapshot
//! - Keep every projection pure: derived fresh per call, nothing cached
//!
//! # Design Decisions
//! - An empty snapshot is a valid state, not an error: `latest_summary`
//!   returns `None` and the CSV export degrades to a header-only document
//! - `status`/`action` are display strings, never part of series or CSV

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::sample::{ordered_fields, Sample};

/// Projection of the newest sample for the dashboard's metric cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestSummary {
    pub timestamp: DateTime<Utc>,
    /// Readings in canonical field order.
    pub readings: Vec<Reading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub field: String,
    pub value: f64,
}

/// Latest summary, or `None` when the snapshot is empty. Expects the
/// snapshot sorted ascending, as every [`crate::sample::log::SampleLog`]
/// snapshot is.
pub fn latest_summary(snapshot: &[Sample]) -> Option<LatestSummary> {
    let latest = snapshot.last()?;
    let readings = ordered_fields(latest.fields.keys().map(String::as_str))
        .into_iter()
        .filter_map(|field| {
            latest.fields.get(&field).map(|&value| Reading { field, value })
        })
        .collect();
    Some(LatestSummary {
        timestamp: latest.timestamp,
        readings,
        status: latest.status.clone(),
        action: latest.action.clone(),
    })
}

/// Time series for one field. Samples missing the field are dropped, so a
/// late-added sensor produces a shorter series rather than gaps.
pub fn series(snapshot: &[Sample], field: &str) -> Vec<(DateTime<Utc>, f64)> {
    snapshot
        .iter()
        .filter_map(|sample| {
            sample
                .fields
                .get(field)
                .map(|&value| (sample.timestamp, value))
        })
        .collect()
}

/// CSV document for a snapshot: `timestamp` column first, then every field
/// observed anywhere in the snapshot in canonical order. Missing fields in
/// a row become empty cells. Empty snapshot yields the header line only.
pub fn export_csv(snapshot: &[Sample]) -> String {
    let mut observed: Vec<&str> = Vec::new();
    for sample in snapshot {
        for field in sample.fields.keys() {
            if !observed.contains(&field.as_str()) {
                observed.push(field);
            }
        }
    }
    let columns = ordered_fields(observed);

    let mut out = String::from("timestamp");
    for column in &columns {
        out.push(',');
        out.push_str(column);
    }
    out.push('\n');

    for sample in snapshot {
        out.push_str(&sample.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true));
        for column in &columns {
            out.push(',');
            if let Some(value) = sample.fields.get(column) {
                out.push_str(&value.to_string());
            }
        }
        out.push('\n');
    }
    out
}

/// Download name for an exported day: `<label>_sensor_data.csv`.
pub fn csv_filename(label: &str) -> String {
    format!("{label}_sensor_data.csv")
}
