//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check required values are present (default domain, table locator)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RedirectConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{RedirectConfig, TableLocation};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required value is absent or empty.
    #[error("missing required value `{0}`")]
    Missing(&'static str),

    /// A value is present but unusable.
    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &RedirectConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let redirect = &config.redirect;
    if redirect.default_domain.trim().is_empty() {
        errors.push(ValidationError::Missing("redirect.default_domain"));
    } else if Url::parse(&redirect.default_domain).is_err() {
        errors.push(ValidationError::Invalid {
            field: "redirect.default_domain",
            reason: format!("'{}' is not an absolute URL", redirect.default_domain),
        });
    } else if redirect.default_domain.ends_with('/') {
        errors.push(ValidationError::Invalid {
            field: "redirect.default_domain",
            reason: "must not end with '/'".to_string(),
        });
    }

    if let Some(field) = redirect.table.missing_field() {
        errors.push(ValidationError::Missing(field));
    } else if let TableLocation::Url { url } = &redirect.table {
        if Url::parse(url).is_err() {
            errors.push(ValidationError::Invalid {
                field: "redirect.table.url",
                reason: format!("'{}' is not an absolute URL", url),
            });
        }
    }

    if redirect.fetch_timeout_ms == 0 {
        errors.push(ValidationError::Invalid {
            field: "redirect.fetch_timeout_ms",
            reason: "must be greater than zero".to_string(),
        });
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Invalid {
            field: "listener.bind_address",
            reason: format!("'{}' is not a socket address", config.listener.bind_address),
        });
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::Invalid {
            field: "listener.max_connections",
            reason: "must be greater than zero".to_string(),
        });
    }

    if config.origin.address.trim().is_empty() {
        errors.push(ValidationError::Missing("origin.address"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Invalid {
            field: "timeouts.request_secs",
            reason: "must be greater than zero".to_string(),
        });
    }
    if config.timeouts.origin_secs == 0 {
        errors.push(ValidationError::Invalid {
            field: "timeouts.origin_secs",
            reason: "must be greater than zero".to_string(),
        });
    }

    let request_ms = config.timeouts.request_secs.saturating_mul(1000);
    if redirect.fetch_timeout_ms > 0 && request_ms > 0 && redirect.fetch_timeout_ms >= request_ms {
        errors.push(ValidationError::Invalid {
            field: "redirect.fetch_timeout_ms",
            reason: format!(
                "{} ms must be shorter than timeouts.request_secs ({} ms)",
                redirect.fetch_timeout_ms, request_ms
            ),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::Invalid {
            field: "observability.metrics_address",
            reason: format!("'{}' is not a socket address", config.observability.metrics_address),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
