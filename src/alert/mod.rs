//! Threshold evaluation.
//!
//! # Responsibilities
//! - Compare one sample against the configured per-field limits
//! - Emit an alert for every field strictly above its limit
//!
//! # Design Decisions
//! - Pure: no clock, no I/O, no retained state; alerts are recomputed
//!   from the latest sample every cycle and never stored
//! - Equality is not an alert; only `value > limit` fires

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sample::Sample;

/// Per-field upper limits. A field without a limit never alerts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aqi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise: Option<f64>,
}

impl ThresholdSet {
    /// Limits in canonical field order.
    pub fn limits(&self) -> [(&'static str, Option<f64>); 5] {
        [
            ("temp", self.temp),
            ("hum", self.hum),
            ("aqi", self.aqi),
            ("gas", self.gas),
            ("noise", self.noise),
        ]
    }
}

/// One field over its limit in the sample under evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub field: String,
    pub value: f64,
    pub limit: f64,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} > {}", self.field, self.value, self.limit)
    }
}

/// Evaluate one sample against the limits. Output order follows the
/// canonical field order, so repeated evaluations are deterministic.
pub fn evaluate(sample: &Sample, thresholds: &ThresholdSet) -> Vec<Alert> {
    let mut alerts = Vec::new();
    for (field, limit) in thresholds.limits() {
        let Some(limit) = limit else { continue };
        let Some(&value) = sample.fields.get(field) else {
            continue;
        };
        if value > limit {
            alerts.push(Alert {
                field: field.to_string(),
                value,
                limit,
            });
        }
    }
    alerts
}
