//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check source-kind coherence (the chosen adapter has what it needs)
//! - Validate value ranges (intervals > 0, addresses parseable)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HubConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::{HubConfig, LogMode, SourceKind};

/// One semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &HubConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.http.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "http.bind_address",
            format!("not a valid socket address: {}", config.http.bind_address),
        ));
    }
    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "http.request_timeout_secs",
            "must be greater than zero",
        ));
    }

    if config.poll.interval_secs == 0 {
        errors.push(ValidationError::new(
            "poll.interval_secs",
            "must be greater than zero",
        ));
    }
    if config.poll.verify_writes && config.poll.verify_attempts == 0 {
        errors.push(ValidationError::new(
            "poll.verify_attempts",
            "must be at least 1 when verify_writes is enabled",
        ));
    }

    if config.source.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "source.timeout_secs",
            "must be greater than zero",
        ));
    }
    match config.source.kind {
        SourceKind::Http => match &config.source.url {
            None => errors.push(ValidationError::new(
                "source.url",
                "required when source.kind is \"http\"",
            )),
            Some(url) if Url::parse(url).is_err() => errors.push(ValidationError::new(
                "source.url",
                format!("not a valid URL: {}", url),
            )),
            Some(_) => {}
        },
        SourceKind::Store => {
            if config.source.path.is_empty() {
                errors.push(ValidationError::new(
                    "source.path",
                    "required when source.kind is \"store\"",
                ));
            }
        }
        SourceKind::Synthetic => {
            if config.source.synthetic_path.is_empty() {
                errors.push(ValidationError::new(
                    "source.synthetic_path",
                    "required when source.kind is \"synthetic\"",
                ));
            }
        }
    }

    if store_required(config) {
        if config.store.base_url.is_empty() {
            errors.push(ValidationError::new(
                "store.base_url",
                "required by the configured source/log modes",
            ));
        } else if Url::parse(&config.store.base_url).is_err() {
            errors.push(ValidationError::new(
                "store.base_url",
                format!("not a valid URL: {}", config.store.base_url),
            ));
        }
        if config.store.history_root.is_empty() {
            errors.push(ValidationError::new("store.history_root", "must not be empty"));
        }
        if config.store.request_timeout_secs == 0 {
            errors.push(ValidationError::new(
                "store.request_timeout_secs",
                "must be greater than zero",
            ));
        }
    }

    if config.log.snapshot_limit == 0 {
        errors.push(ValidationError::new(
            "log.snapshot_limit",
            "must be greater than zero",
        ));
    }

    for (field, limit) in config.thresholds.limits() {
        if let Some(limit) = limit {
            if !limit.is_finite() {
                errors.push(ValidationError::new(
                    &format!("thresholds.{}", field),
                    "must be a finite number",
                ));
            }
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "not a valid socket address: {}",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Whether any configured mode needs a reachable store.
fn store_required(config: &HubConfig) -> bool {
    config.log.mode == LogMode::Store
        || matches!(config.source.kind, SourceKind::Store | SourceKind::Synthetic)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> HubConfig {
        let mut config = HubConfig::default();
        config.source.url = Some("http://device.local/reading".to_string());
        config
    }

    #[test]
    fn test_http_source_requires_url() {
        let config = HubConfig::default();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "source.url"));
    }

    #[test]
    fn test_minimal_http_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = valid_config();
        config.poll.interval_secs = 0;
        config.http.bind_address = "nonsense".to_string();
        config.thresholds.temp = Some(f64::NAN);

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"poll.interval_secs"));
        assert!(fields.contains(&"http.bind_address"));
        assert!(fields.contains(&"thresholds.temp"));
    }

    #[test]
    fn test_store_log_requires_base_url() {
        let mut config = valid_config();
        config.log.mode = LogMode::Store;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "store.base_url"));

        config.store.base_url = "http://127.0.0.1:9000/".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_synthetic_source_needs_store_and_path() {
        let mut config = HubConfig::default();
        config.source.kind = SourceKind::Synthetic;
        config.source.synthetic_path = String::new();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"source.synthetic_path"));
        assert!(fields.contains(&"store.base_url"));
    }
}
