//! Per-request context captured when a request enters the middleware.
//!
//! # Responsibilities
//! - Record start time (monotonic for durations, wall clock for display)
//! - Keep the original URL, even if an inner router rewrites the path
//! - Resolve the remote address once and cache it
//!
//! # Design Decisions
//! - Address precedence: `ClientAddr` override > `ConnectInfo` peer > raw `SocketAddr`
//! - Headers are cloned so the context outlives the request it was built from

use std::net::{IpAddr, SocketAddr};
use std::time::Instant;

use axum::extract::{ConnectInfo, OriginalUri};
use axum::http::{HeaderMap, Method, Request, Version};
use chrono::{DateTime, Utc};

/// Explicit client address set by an earlier layer (e.g. from a trusted
/// `X-Forwarded-For`). Takes precedence over the socket peer address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddr(pub IpAddr);

/// Snapshot of the request side of an exchange.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    url: String,
    version: Version,
    headers: HeaderMap,
    started: Instant,
    started_at: DateTime<Utc>,
    remote_addr: Option<IpAddr>,
}

impl RequestContext {
    /// Build the context from an incoming request.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let url = match request.extensions().get::<OriginalUri>() {
            Some(OriginalUri(uri)) => uri.to_string(),
            None => request.uri().to_string(),
        };

        Self {
            method: request.method().clone(),
            url,
            version: request.version(),
            headers: request.headers().clone(),
            started: Instant::now(),
            started_at: Utc::now(),
            remote_addr: resolve_remote_addr(request),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Original request target (path and query).
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Monotonic start instant, used for response time.
    pub fn started(&self) -> Instant {
        self.started
    }

    /// Wall-clock time the request arrived.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn remote_addr(&self) -> Option<IpAddr> {
        self.remote_addr
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or_default()
    }

    /// All values of a header joined with `", "`, `None` if missing or not text.
    pub fn header(&self, name: &str) -> Option<String> {
        join_header_values(&self.headers, name)
    }
}

fn resolve_remote_addr<B>(request: &Request<B>) -> Option<IpAddr> {
    let extensions = request.extensions();
    if let Some(ClientAddr(ip)) = extensions.get::<ClientAddr>() {
        return Some(*ip);
    }
    if let Some(ConnectInfo(addr)) = extensions.get::<ConnectInfo<SocketAddr>>() {
        return Some(addr.ip());
    }
    extensions.get::<SocketAddr>().map(|addr| addr.ip())
}

pub(crate) fn join_header_values(headers: &HeaderMap, name: &str) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}
