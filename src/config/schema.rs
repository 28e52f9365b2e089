//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the logger
//! and the bundled demo server. All types derive Serde traits for
//! deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::observability::logging::DEFAULT_FILTER;
use crate::sink::{BufferSetting, StreamTarget};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Demo server settings.
    pub server: ServerConfig,

    /// Access log middleware settings.
    pub logger: LoggerConfig,

    /// Diagnostics and metrics.
    pub observability: ObservabilityConfig,
}

/// Demo server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Access log middleware configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LoggerConfig {
    /// Preset name (`default`, `combined`, `common`) or a template string.
    pub format: Option<String>,

    /// `stdout`, `stderr`, or a file path.
    pub stream: StreamTarget,

    /// `false`, `true` (1000 ms) or a flush interval in milliseconds.
    pub buffer: BufferSetting,

    /// Requests matching these rules are not logged.
    pub skip: SkipConfig,

    /// Enables server error reporting when present.
    pub error_reporting: Option<ErrorReportingConfig>,

    /// Prefix of the posted error message.
    pub error_heading: Option<String>,
}

/// Declarative skip rules.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SkipConfig {
    /// Path prefixes that are never logged.
    pub paths: Vec<String>,

    /// Skip responses whose status is below this value.
    pub status_below: Option<u16>,
}

impl SkipConfig {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.status_below.is_none()
    }
}

/// Error reporting services.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorReportingConfig {
    /// Timeout for each outbound call.
    #[serde(default = "default_report_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub gist: GistConfig,

    pub shortener: ShortenerConfig,

    pub poster: PosterConfig,
}

fn default_report_timeout() -> u64 {
    10
}

/// GitHub Gist API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GistConfig {
    pub api_url: String,
    pub token: Option<String>,
}

impl Default for GistConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            token: None,
        }
    }
}

/// URL shortener settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShortenerConfig {
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Status poster settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PosterConfig {
    pub endpoint: String,
    #[serde(default)]
    pub token: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus listen address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_FILTER.to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
