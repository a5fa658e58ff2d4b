//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check the base path shape
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ServerConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("jsondb.base_path `{0}` must start with `/` and have no trailing slash")]
    InvalidBasePath(String),

    #[error("jsondb.path must not be empty")]
    EmptyDocumentPath,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("limits.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),
}

pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let base_path = &config.jsondb.base_path;
    if !base_path.starts_with('/') || (base_path.len() > 1 && base_path.ends_with('/')) {
        errors.push(ValidationError::InvalidBasePath(base_path.clone()));
    }

    if config.jsondb.path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyDocumentPath);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn test_root_base_path_is_valid() {
        let mut config = ServerConfig::default();
        config.jsondb.base_path = "/".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "localhost".into();
        config.jsondb.base_path = "api/".into();
        config.timeouts.request_secs = 0;
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nope".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidBindAddress("localhost".into()),
                ValidationError::InvalidBasePath("api/".into()),
                ValidationError::ZeroTimeout,
                ValidationError::InvalidMetricsAddress("nope".into()),
            ]
        );
    }

    #[test]
    fn test_trailing_slash_rejected() {
        let mut config = ServerConfig::default();
        config.jsondb.base_path = "/api/".into();
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::InvalidBasePath("/api/".into())])
        );
    }
}
