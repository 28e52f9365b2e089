//! Server error reporting.
//!
//! # Data Flow
//! ```text
//! captured 5xx body
//!     → PasteStore::store   (gist.rs: document URL)
//!     → UrlShortener::shorten (shortener.rs: short URL)
//!     → StatusPoster::post  (poster.rs: heading + short URL)
//! ```
//!
//! # Design Decisions
//! - Runs as a detached tokio task; the response never waits on it
//! - A failed stage stops the pipeline; no retries
//! - Failures are logged and counted, never returned to the request path

pub mod gist;
pub mod poster;
pub mod shortener;

pub use gist::GistStore;
pub use poster::WebhookPoster;
pub use shortener::HttpShortener;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::ErrorReportingConfig;
use crate::observability::metrics;

/// Prefix of the posted message unless configured otherwise.
pub const DEFAULT_HEADING: &str = "I had an error @ ";

/// Description attached to stored error documents.
pub const DOCUMENT_DESCRIPTION: &str = "Error found in my Application";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error during {stage}: {source}")]
    Http {
        stage: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{stage} returned status {status}")]
    Status {
        stage: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("{stage} response is missing `{field}`")]
    MissingField {
        stage: &'static str,
        field: &'static str,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Stores an error payload and returns a URL where it can be read.
#[async_trait]
pub trait PasteStore: Send + Sync {
    async fn store(&self, contents: &str, description: &str) -> Result<String, NotifyError>;
}

/// Turns a long URL into a short one.
#[async_trait]
pub trait UrlShortener: Send + Sync {
    async fn shorten(&self, url: &str) -> Result<String, NotifyError>;
}

/// Publishes a short status message.
#[async_trait]
pub trait StatusPoster: Send + Sync {
    async fn post(&self, message: &str) -> Result<(), NotifyError>;
}

/// The store → shorten → post pipeline.
#[derive(Clone)]
pub struct ErrorNotifier {
    store: Arc<dyn PasteStore>,
    shortener: Arc<dyn UrlShortener>,
    poster: Arc<dyn StatusPoster>,
    heading: String,
}

impl ErrorNotifier {
    pub fn new(
        store: Arc<dyn PasteStore>,
        shortener: Arc<dyn UrlShortener>,
        poster: Arc<dyn StatusPoster>,
    ) -> Self {
        Self {
            store,
            shortener,
            poster,
            heading: DEFAULT_HEADING.to_string(),
        }
    }

    /// HTTP-backed notifier for the configured services.
    pub fn from_config(config: &ErrorReportingConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("twlog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(NotifyError::Client)?;

        Ok(Self::new(
            Arc::new(GistStore::new(client.clone(), &config.gist)),
            Arc::new(HttpShortener::new(client.clone(), &config.shortener)),
            Arc::new(WebhookPoster::new(client, &config.poster)),
        ))
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = heading.into();
        self
    }

    pub fn heading(&self) -> &str {
        &self.heading
    }

    /// Run all three stages; returns the posted message.
    pub async fn run(&self, payload: &str) -> Result<String, NotifyError> {
        let document_url = self.store.store(payload, DOCUMENT_DESCRIPTION).await?;
        let short_url = self.shortener.shorten(&document_url).await?;
        tracing::debug!(short_url = %short_url, "Error posted at short URL");

        let message = format!("{}{}", self.heading, short_url);
        self.poster.post(&message).await?;
        Ok(message)
    }

    /// Spawn the pipeline detached from the caller. Returns `None` when there
    /// is no runtime to spawn on.
    pub fn report(&self, payload: String) -> Option<JoinHandle<()>> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!("No async runtime available, dropping error report");
                metrics::record_error_report("dropped");
                return None;
            }
        };

        let notifier = self.clone();
        Some(runtime.spawn(async move {
            match notifier.run(&payload).await {
                Ok(message) => {
                    tracing::info!(message = %message, "Reported server error");
                    metrics::record_error_report("posted");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Error report failed");
                    metrics::record_error_report("failed");
                }
            }
        }))
    }
}

impl std::fmt::Debug for ErrorNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorNotifier")
            .field("heading", &self.heading)
            .finish_non_exhaustive()
    }
}
