//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and origin URLs before they reach the gates
//! - Validate value ranges (timeouts > 0, limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before a config is accepted into the system, including reloads

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// One semantic problem with a configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid bind address {0:?}")]
    InvalidBindAddress(String),
    #[error("invalid upstream address {0:?}")]
    InvalidUpstreamAddress(String),
    #[error("invalid metrics address {0:?}")]
    InvalidMetricsAddress(String),
    #[error("origin {0:?} is not a valid http(s) URL")]
    InvalidOrigin(String),
    #[error("auth endpoint {0:?} is not a valid http(s) URL")]
    InvalidAuthEndpoint(String),
    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.upstream.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidUpstreamAddress(
            config.upstream.address.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    for origin in &config.security.allowed_origins {
        if !is_http_origin(origin) {
            errors.push(ValidationError::InvalidOrigin(origin.clone()));
        }
    }

    for endpoint in [&config.auth.session_verify_url, &config.auth.directory_url] {
        if !is_http_origin(endpoint) {
            errors.push(ValidationError::InvalidAuthEndpoint(endpoint.clone()));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.request_secs"));
    }
    if config.timeouts.auth_call_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.auth_call_secs"));
    }
    if config.security.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroValue("security.max_body_bytes"));
    }
    if config.security.sweep_interval_secs == 0 {
        errors.push(ValidationError::ZeroValue("security.sweep_interval_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_origin(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn bad_addresses_are_reported_together() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-addr".into();
        config.upstream.address = "also bad".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ValidationError::InvalidBindAddress(_)));
        assert!(matches!(errors[1], ValidationError::InvalidUpstreamAddress(_)));
    }

    #[test]
    fn malformed_origin_is_rejected() {
        let mut config = GatewayConfig::default();
        config.security.allowed_origins = vec![
            "https://unicore.edu".into(),
            "ftp://mirror.unicore.edu".into(),
        ];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidOrigin(
                "ftp://mirror.unicore.edu".into()
            )]
        );
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let mut config = GatewayConfig::default();
        config.timeouts.auth_call_secs = 0;
        config.security.sweep_interval_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn metrics_address_only_checked_when_enabled() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_address = "bogus".into();
        config.observability.metrics_enabled = false;
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
