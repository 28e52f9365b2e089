//! Read-only view of a finished response.
//!
//! Built by the completion hook once the response is finalized and handed to
//! the skip predicate and the renderer. Every field is optional: a request
//! torn down before its head was produced has no status, no headers and no
//! end time.

use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};

use crate::http::request::join_header_values;

#[derive(Debug, Clone, Default)]
pub struct ResponseView {
    status: Option<StatusCode>,
    headers: Option<HeaderMap>,
    finished: Option<Instant>,
    error_body: Option<Bytes>,
}

impl ResponseView {
    /// A response whose head was sent and which finished at `finished`.
    pub fn completed(status: StatusCode, headers: HeaderMap, finished: Instant) -> Self {
        Self {
            status: Some(status),
            headers: Some(headers),
            finished: Some(finished),
            error_body: None,
        }
    }

    /// A response that never produced a head.
    pub fn unsent() -> Self {
        Self::default()
    }

    /// Attach the captured body of a server error.
    pub fn with_error_body(mut self, body: Bytes) -> Self {
        self.error_body = Some(body);
        self
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn headers(&self) -> Option<&HeaderMap> {
        self.headers.as_ref()
    }

    /// Case-insensitive header lookup; `None` if the response was never finalized.
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .as_ref()
            .and_then(|headers| join_header_values(headers, name))
    }

    pub fn finished(&self) -> Option<Instant> {
        self.finished
    }

    /// Body captured for a 5xx response.
    pub fn error_body(&self) -> Option<&Bytes> {
        self.error_body.as_ref()
    }

    /// Time from `started` to completion, if completion was captured.
    pub fn elapsed_since(&self, started: Instant) -> Option<Duration> {
        self.finished
            .map(|finished| finished.saturating_duration_since(started))
    }

    /// Status strictly above 499.
    pub fn is_server_error(&self) -> bool {
        self.status.map_or(false, |s| s.as_u16() > 499)
    }
}
