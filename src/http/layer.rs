//! Access log middleware.
//!
//! # Responsibilities
//! - Build the logger from options or config, failing fast on bad formats
//! - Wrap each request in completion tracking
//! - On completion: skip check, render, write, report server errors
//!
//! # Design Decisions
//! - One `AccessLogger` per layer, shared by every request through `Arc`
//! - The layer never changes the response; logging problems are only traced

use std::future::Future;
use std::io::{self, Write};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::http::{Request, Response};
use hyper::body::Body as HttpBody;
use thiserror::Error;
use tower::{Layer, Service};

use crate::config::{LoggerConfig, SkipConfig};
use crate::format::{CompiledFormat, FormatError, FormatSpec};
use crate::http::completion::{Completion, LoggedBody};
use crate::http::{RequestContext, ResponseView};
use crate::notify::{ErrorNotifier, NotifyError};
use crate::observability::metrics;
use crate::sink::{Buffer, LogSink, StreamSink};

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Decides whether a finished exchange is left out of the log.
pub type SkipFn = Arc<dyn Fn(&RequestContext, &ResponseView) -> bool + Send + Sync>;

/// Errors raised while constructing the middleware.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid log format: {0}")]
    Format(#[from] FormatError),

    #[error("failed to open log stream: {0}")]
    Stream(#[source] io::Error),

    #[error("failed to set up error reporting: {0}")]
    Notifier(#[from] NotifyError),
}

/// Shared state of one middleware instance.
pub struct AccessLogger {
    format: CompiledFormat,
    sink: LogSink,
    skip: Option<SkipFn>,
    notifier: Option<ErrorNotifier>,
}

impl AccessLogger {
    /// Handle one finished exchange.
    pub fn log(&self, request: &RequestContext, response: &ResponseView) {
        if let Some(skip) = &self.skip {
            if skip(request, response) {
                tracing::debug!(method = %request.method(), url = %request.url(), "Skipping request");
                metrics::record_skipped();
                return;
            }
        }

        let mut line = self.format.render(request, response);
        line.push('\n');

        let status = response.status().map(|s| s.as_u16());
        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            status = ?status,
            "Logging request"
        );
        metrics::record_line(status, response.elapsed_since(request.started()));
        self.sink.write(line);

        if response.is_server_error() {
            if let Some(notifier) = &self.notifier {
                let payload = response
                    .error_body()
                    .map(|body| String::from_utf8_lossy(body).into_owned())
                    .unwrap_or_default();
                notifier.report(payload);
            }
        }
    }

    pub fn format(&self) -> &CompiledFormat {
        &self.format
    }

    pub fn is_buffered(&self) -> bool {
        self.sink.is_buffered()
    }

    pub fn reports_errors(&self) -> bool {
        self.notifier.is_some()
    }

    pub fn flush(&self) {
        self.sink.flush();
    }
}

/// Options for an [`AccessLogLayer`].
#[derive(Default)]
pub struct AccessLogBuilder {
    format: Option<String>,
    stream: Option<StreamSink>,
    buffer: Buffer,
    skip: Option<SkipFn>,
    notifier: Option<ErrorNotifier>,
    error_heading: Option<String>,
}

impl AccessLogBuilder {
    /// Preset name or template. Defaults to the `default` preset.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Destination writer. Defaults to stdout.
    pub fn stream<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.stream = Some(StreamSink::new(writer));
        self
    }

    pub fn stream_sink(mut self, stream: StreamSink) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn buffer(mut self, buffer: Buffer) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn skip<F>(mut self, skip: F) -> Self
    where
        F: Fn(&RequestContext, &ResponseView) -> bool + Send + Sync + 'static,
    {
        self.skip = Some(Arc::new(skip));
        self
    }

    /// Report server errors through this notifier.
    pub fn notifier(mut self, notifier: ErrorNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn error_heading(mut self, heading: impl Into<String>) -> Self {
        self.error_heading = Some(heading.into());
        self
    }

    pub fn build(self) -> Result<AccessLogLayer, BuildError> {
        let spec = FormatSpec::resolve(self.format.as_deref());
        let format = CompiledFormat::from_spec(&spec)?;

        let stream = self.stream.unwrap_or_else(|| StreamSink::new(io::stdout()));
        let sink = LogSink::new(stream, self.buffer);

        let notifier = match (self.notifier, self.error_heading) {
            (Some(notifier), Some(heading)) => Some(notifier.with_heading(heading)),
            (notifier, _) => notifier,
        };

        tracing::info!(
            format = %spec,
            buffer = ?self.buffer.interval(),
            error_reporting = notifier.is_some(),
            "Access log configured"
        );

        Ok(AccessLogLayer {
            logger: Arc::new(AccessLogger {
                format,
                sink,
                skip: self.skip,
                notifier,
            }),
        })
    }
}

/// Tower layer that writes one access log line per request.
#[derive(Clone)]
pub struct AccessLogLayer {
    logger: Arc<AccessLogger>,
}

impl AccessLogLayer {
    pub fn builder() -> AccessLogBuilder {
        AccessLogBuilder::default()
    }

    /// Build from the `[logger]` config section.
    pub fn from_config(config: &LoggerConfig) -> Result<Self, BuildError> {
        let mut builder = Self::builder()
            .stream_sink(config.stream.open().map_err(BuildError::Stream)?)
            .buffer(config.buffer.into());

        if let Some(format) = &config.format {
            builder = builder.format(format.clone());
        }
        if let Some(reporting) = &config.error_reporting {
            builder = builder.notifier(ErrorNotifier::from_config(reporting)?);
        }
        if let Some(heading) = &config.error_heading {
            builder = builder.error_heading(heading.clone());
        }
        if !config.skip.is_empty() {
            let rules = config.skip.clone();
            builder = builder.skip(move |req, res| skip_by_rules(&rules, req, res));
        }

        builder.build()
    }

    pub fn logger(&self) -> Arc<AccessLogger> {
        self.logger.clone()
    }

    /// Write out buffered lines now.
    pub fn flush(&self) {
        self.logger.flush();
    }
}

impl<S> Layer<S> for AccessLogLayer {
    type Service = AccessLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessLogService {
            inner,
            logger: self.logger.clone(),
        }
    }
}

fn skip_by_rules(rules: &SkipConfig, request: &RequestContext, response: &ResponseView) -> bool {
    let path = request.path();
    if rules.paths.iter().any(|prefix| path.starts_with(prefix.as_str())) {
        return true;
    }
    match (rules.status_below, response.status()) {
        (Some(limit), Some(status)) => status.as_u16() < limit,
        _ => false,
    }
}

/// Service produced by [`AccessLogLayer`].
#[derive(Clone)]
pub struct AccessLogService<S> {
    inner: S,
    logger: Arc<AccessLogger>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AccessLogService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: HttpBody<Data = Bytes> + Send + 'static,
    ResBody::Error: Into<BoxError>,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let context = RequestContext::from_request(&request);
        let mut completion = Completion::new(context, self.logger.clone());

        // Take the service that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            match inner.call(request).await {
                Ok(response) => {
                    let (parts, body) = response.into_parts();
                    completion.head_sent(parts.status, &parts.headers);
                    let body = LoggedBody::new(Body::new(body), completion);
                    Ok(Response::from_parts(parts, Body::new(body)))
                }
                Err(e) => {
                    completion.finish();
                    Err(e)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemoryStream;
    use axum::http::{HeaderMap, StatusCode};
    use std::time::Instant;

    fn get(uri: &str) -> RequestContext {
        RequestContext::from_request(&Request::get(uri).body(()).unwrap())
    }

    fn done(status: u16) -> ResponseView {
        ResponseView::completed(StatusCode::from_u16(status).unwrap(), HeaderMap::new(), Instant::now())
    }

    #[test]
    fn test_build_rejects_unknown_token() {
        let result = AccessLogLayer::builder().format(":wat").build();
        assert!(matches!(result, Err(BuildError::Format(FormatError::UnknownToken(_)))));
    }

    #[test]
    fn test_skip_suppresses_write() {
        let memory = MemoryStream::new();
        let layer = AccessLogLayer::builder()
            .format(":url")
            .stream(memory.clone())
            .skip(|req, _res| req.url() == "/quiet")
            .build()
            .unwrap();

        let logger = layer.logger();
        logger.log(&get("/quiet"), &done(200));
        logger.log(&get("/loud"), &done(200));

        assert_eq!(memory.writes(), vec!["/loud\n"]);
    }

    #[test]
    fn test_skip_rules() {
        let rules = SkipConfig {
            paths: vec!["/health".into()],
            status_below: Some(400),
        };
        assert!(skip_by_rules(&rules, &get("/health/live"), &done(500)));
        assert!(skip_by_rules(&rules, &get("/api"), &done(204)));
        assert!(!skip_by_rules(&rules, &get("/api"), &done(404)));
        assert!(!skip_by_rules(&rules, &get("/api"), &ResponseView::unsent()));
    }

    #[test]
    fn test_from_config_defaults() {
        let mut config = LoggerConfig::default();
        config.format = Some("common".into());
        config.buffer = crate::sink::BufferSetting::Enabled(true);

        let layer = AccessLogLayer::from_config(&config).unwrap();
        let logger = layer.logger();
        assert!(logger.is_buffered());
        assert!(!logger.reports_errors());
        assert_eq!(logger.format().to_string(), crate::format::preset::COMMON);
    }
}
