//! HTTP access-log middleware for tower and axum.
//!
//! Renders one line per request from a small token language
//! (`:method :url :status ...`), writes it to a stream, optionally batching
//! writes over a time window, and can report server errors through a
//! store → shorten → post pipeline.
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use twlog::http::AccessLogLayer;
//!
//! # fn build() -> Result<Router, twlog::http::BuildError> {
//! let access_log = AccessLogLayer::builder().format("combined").build()?;
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "hello" }))
//!     .layer(access_log);
//! # Ok(app)
//! # }
//! ```

pub mod config;
pub mod format;
pub mod http;
pub mod notify;
pub mod observability;
pub mod sink;

pub use config::AppConfig;
pub use http::{AccessLogLayer, DemoServer};
