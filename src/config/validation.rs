//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile the log format so unknown tokens fail before serving
//! - Validate addresses, endpoints and timeouts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::AppConfig;
use crate::format::{CompiledFormat, FormatSpec};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("invalid socket address `{}`", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be > 0"));
    }

    let spec = FormatSpec::resolve(config.logger.format.as_deref());
    if let Err(e) = CompiledFormat::from_spec(&spec) {
        errors.push(ValidationError::new("logger.format", e.to_string()));
    }

    if let Some(reporting) = &config.logger.error_reporting {
        if reporting.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "logger.error_reporting.timeout_secs",
                "must be > 0",
            ));
        }
        let endpoints = [
            ("logger.error_reporting.gist.api_url", &reporting.gist.api_url),
            ("logger.error_reporting.shortener.endpoint", &reporting.shortener.endpoint),
            ("logger.error_reporting.poster.endpoint", &reporting.poster.endpoint),
        ];
        for (field, endpoint) in endpoints {
            if let Err(e) = url::Url::parse(endpoint) {
                errors.push(ValidationError::new(field, format!("invalid URL `{}`: {}", endpoint, e)));
            }
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address `{}`", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
