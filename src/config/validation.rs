//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the collector endpoint is a usable http(s) URL
//! - Check listener and metrics addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::{AppConfig, InstrumentorConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("honeycomb.api_host `{0}` is not a valid http(s) URL")]
    InvalidApiHost(String),

    #[error("honeycomb.dataset must not be empty")]
    EmptyDataset,

    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a complete application configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = instrumentor_errors(&config.honeycomb);

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate only the middleware options.
pub fn validate_instrumentor(config: &InstrumentorConfig) -> Result<(), Vec<ValidationError>> {
    let errors = instrumentor_errors(config);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn instrumentor_errors(config: &InstrumentorConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(host) = &config.api_host {
        let valid = Url::parse(host)
            .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::InvalidApiHost(host.clone()));
        }
    }

    if matches!(&config.dataset, Some(d) if d.trim().is_empty()) {
        errors.push(ValidationError::EmptyDataset);
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.honeycomb.api_host = Some("ftp://collector".into());
        config.honeycomb.dataset = Some("  ".into());
        config.listener.bind_address = "localhost".into();
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nope".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidApiHost("ftp://collector".into()),
                ValidationError::EmptyDataset,
                ValidationError::InvalidBindAddress("localhost".into()),
                ValidationError::InvalidMetricsAddress("nope".into()),
            ]
        );
    }

    #[test]
    fn test_metrics_address_ignored_when_disabled() {
        let mut config = AppConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_instrumentor_accepts_custom_host() {
        let config = InstrumentorConfig {
            api_host: Some("http://127.0.0.1:8082".into()),
            dataset: Some("requests".into()),
            ..Default::default()
        };
        assert!(validate_instrumentor(&config).is_ok());
    }
}
