//! Sample data model.
//!
//! # Responsibilities
//! - Define the `Sample` type: one timestamped set of numeric readings
//! - Decode external JSON payloads into samples (liberal, never panics)
//! - Convert samples to/from the flat record shape the remote store holds
//!
//! # Design Decisions
//! - Fields are a name → f64 map; absent fields stay absent (placeholders
//!   are a presentation concern, not a data concern)
//! - Numeric strings decode as numbers; device firmwares publish both
//! - `status`/`action` strings pass through untouched, excluded from
//!   series, CSV and alerting

pub mod log;

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, TimeZone, Utc};
use serde::Serialize;
use thiserror::Error;

/// Canonical presentation order for the well-known reading fields.
/// Unknown fields sort alphabetically after these.
pub const FIELD_ORDER: &[&str] = &["temp", "hum", "aqi", "gas", "noise", "value"];

/// Record keys that are never numeric readings.
const RESERVED_KEYS: &[&str] = &["timestamp", "time", "status", "action"];

/// One observation: a timestamp plus named numeric readings.
///
/// Serializes flat (`{"timestamp": ..., "temp": 25.1, ...}`), matching the
/// record shape held by the remote store and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    /// Stamped at fetch completion, whole-second resolution.
    pub timestamp: DateTime<Utc>,

    /// Named numeric readings (e.g. `temp`, `hum`, `aqi`, `gas`, `noise`).
    #[serde(flatten)]
    pub fields: BTreeMap<String, f64>,

    /// Free-form device status line, if the source publishes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Device-reported action hint, if the source publishes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// Errors decoding a live source payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The response body was not a JSON object.
    #[error("payload is not a flat JSON object")]
    NotAnObject,

    /// The object carried neither a numeric reading nor a status string.
    #[error("payload carries no readings")]
    NoReadings,
}

impl Sample {
    /// Create a sample stamped with the current wall-clock time,
    /// truncated to whole seconds.
    pub fn now(fields: BTreeMap<String, f64>) -> Self {
        Self {
            timestamp: Utc::now().trunc_subsecs(0),
            fields,
            status: None,
            action: None,
        }
    }

    /// Decode a live payload (HTTP body or store node) into a sample
    /// stamped `timestamp`.
    ///
    /// Numeric members and numeric strings become fields; `status` and
    /// `action` strings pass through; everything else is ignored. An object
    /// yielding neither a reading nor a status is malformed.
    pub fn from_payload(
        payload: &serde_json::Value,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, PayloadError> {
        let object = payload.as_object().ok_or(PayloadError::NotAnObject)?;

        let mut fields = BTreeMap::new();
        for (key, value) in object {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            if let Some(number) = numeric_value(value) {
                fields.insert(key.clone(), number);
            }
        }

        let status = string_member(object, "status");
        let action = string_member(object, "action");

        if fields.is_empty() && status.is_none() {
            return Err(PayloadError::NoReadings);
        }

        Ok(Self {
            timestamp: timestamp.trunc_subsecs(0),
            fields,
            status,
            action,
        })
    }

    /// Parse a stored record back into a sample.
    ///
    /// Returns `None` when the record has no parseable timestamp; such
    /// entries are filtered out of snapshots rather than surfaced. Members
    /// that are not numeric are dropped, not errors.
    pub fn from_record(record: &serde_json::Value) -> Option<Self> {
        let object = record.as_object()?;

        let timestamp = object
            .get("timestamp")
            .or_else(|| object.get("time"))
            .and_then(parse_timestamp)?;

        let mut fields = BTreeMap::new();
        for (key, value) in object {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            if let Some(number) = numeric_value(value) {
                fields.insert(key.clone(), number);
            }
        }

        Some(Self {
            timestamp,
            fields,
            status: string_member(object, "status"),
            action: string_member(object, "action"),
        })
    }

    /// The flat record written to the remote store.
    pub fn to_record(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// UTC calendar date of this sample (names the store partition).
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Stable chronological sort; ties keep their relative (storage) order.
pub fn sort_chronologically(samples: &mut [Sample]) {
    samples.sort_by_key(|sample| sample.timestamp);
}

/// Presentation column order for a set of field names: canonical fields
/// first, everything else alphabetically.
pub fn ordered_fields<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut known = Vec::new();
    let mut extra = Vec::new();
    for name in names {
        if FIELD_ORDER.contains(&name) {
            known.push(name);
        } else {
            extra.push(name);
        }
    }
    known.sort_by_key(|name| FIELD_ORDER.iter().position(|f| f == name));
    extra.sort_unstable();
    extra.dedup();

    known
        .into_iter()
        .chain(extra)
        .map(str::to_owned)
        .collect()
}

/// Extract a number from a JSON value, accepting numeric strings.
fn numeric_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn string_member(
    object: &serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Option<String> {
    object
        .get(key)
        .and_then(|value| value.as_str())
        .map(str::to_owned)
}

/// Parse a stored timestamp. Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`
/// (assumed UTC), and epoch seconds; store writers vary.
fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(text) => {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
                return Some(parsed.with_timezone(&Utc));
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
                return Some(Utc.from_utc_datetime(&naive));
            }
            None
        }
        serde_json::Value::Number(n) => {
            let secs = n.as_f64()?;
            Utc.timestamp_opt(secs as i64, 0).single()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_payload_decoding() {
        let payload = json!({
            "temp": 24.5,
            "hum": "61.2",
            "aqi": 80,
            "status": "All normal",
            "calibration": {"offset": 1.2},
            "label": "rooftop"
        });

        let sample = Sample::from_payload(&payload, ts(1_000)).unwrap();
        assert_eq!(sample.fields.get("temp"), Some(&24.5));
        assert_eq!(sample.fields.get("hum"), Some(&61.2)); // numeric string
        assert_eq!(sample.fields.get("aqi"), Some(&80.0));
        assert_eq!(sample.status.as_deref(), Some("All normal"));
        assert!(sample.fields.get("calibration").is_none()); // nested dropped
        assert!(sample.fields.get("label").is_none()); // non-numeric dropped
    }

    #[test]
    fn test_payload_rejects_non_objects_and_empty() {
        assert!(matches!(
            Sample::from_payload(&json!([1, 2, 3]), ts(0)),
            Err(PayloadError::NotAnObject)
        ));
        assert!(matches!(
            Sample::from_payload(&json!(42.0), ts(0)),
            Err(PayloadError::NotAnObject)
        ));
        assert!(matches!(
            Sample::from_payload(&json!({"label": "x", "nested": {}}), ts(0)),
            Err(PayloadError::NoReadings)
        ));
        // A status-only payload is still a valid observation.
        let sample = Sample::from_payload(&json!({"status": "booting"}), ts(0)).unwrap();
        assert!(sample.fields.is_empty());
        assert_eq!(sample.status.as_deref(), Some("booting"));
    }

    #[test]
    fn test_record_round_trip() {
        let mut fields = BTreeMap::new();
        fields.insert("temp".to_string(), 19.25);
        fields.insert("noise".to_string(), 44.0);
        let sample = Sample {
            timestamp: ts(1_700_000_000),
            fields,
            status: Some("ok".to_string()),
            action: None,
        };

        let record = sample.to_record();
        assert_eq!(record["temp"], json!(19.25));
        assert_eq!(record["status"], json!("ok"));
        assert!(record.get("action").is_none());

        let parsed = Sample::from_record(&record).unwrap();
        assert_eq!(parsed, sample);
    }

    #[test]
    fn test_record_timestamp_formats() {
        let rfc = Sample::from_record(&json!({"timestamp": "2025-03-14T09:26:53Z", "temp": 1}));
        assert!(rfc.is_some());

        let plain =
            Sample::from_record(&json!({"timestamp": "2025-03-14 09:26:53", "temp": 1}))
                .unwrap();
        assert_eq!(plain.timestamp, rfc.unwrap().timestamp);

        let epoch = Sample::from_record(&json!({"time": 1_700_000_000, "hum": 50})).unwrap();
        assert_eq!(epoch.timestamp, ts(1_700_000_000));

        // Missing or garbage timestamps mark the record malformed.
        assert!(Sample::from_record(&json!({"temp": 20})).is_none());
        assert!(Sample::from_record(&json!({"timestamp": "yesterday", "temp": 20})).is_none());
        assert!(Sample::from_record(&json!("not an object")).is_none());
    }

    #[test]
    fn test_sort_is_stable_and_chronological() {
        let mut fields_a = BTreeMap::new();
        fields_a.insert("temp".to_string(), 1.0);
        let mut fields_b = BTreeMap::new();
        fields_b.insert("temp".to_string(), 2.0);

        let mut samples = vec![
            Sample { timestamp: ts(30), fields: fields_b.clone(), status: None, action: None },
            Sample { timestamp: ts(10), fields: fields_a.clone(), status: None, action: None },
            Sample { timestamp: ts(30), fields: fields_a, status: None, action: None },
        ];
        sort_chronologically(&mut samples);

        assert_eq!(samples[0].timestamp, ts(10));
        // Tie at ts(30) keeps original relative order.
        assert_eq!(samples[1].fields.get("temp"), Some(&2.0));
        assert_eq!(samples[2].fields.get("temp"), Some(&1.0));
    }

    #[test]
    fn test_ordered_fields_canonical_first() {
        let ordered = ordered_fields(["noise", "zeta", "temp", "alpha", "hum"]);
        assert_eq!(ordered, vec!["temp", "hum", "noise", "alpha", "zeta"]);
    }
}
