//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{Request, Response};
use hyper::body::{Body as HttpBody, Frame};
use tower::Service;

use twlog::notify::{ErrorNotifier, NotifyError, PasteStore, StatusPoster, UrlShortener};

/// Body without an exact size, so no `content-length` is derived for it.
pub struct ChunkedBody {
    chunk: Option<Bytes>,
}

impl ChunkedBody {
    pub fn new(text: &'static str) -> Body {
        Body::new(Self {
            chunk: Some(Bytes::from_static(text.as_bytes())),
        })
    }
}

impl HttpBody for ChunkedBody {
    type Data = Bytes;
    type Error = std::convert::Infallible;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, Self::Error>>> {
        Poll::Ready(self.chunk.take().map(|chunk| Ok(Frame::data(chunk))))
    }
}

/// Records every stage of the error pipeline.
#[derive(Default)]
pub struct RecordingServices {
    pub stored: Mutex<Vec<String>>,
    pub shortened: Mutex<Vec<String>>,
    pub posted: Mutex<Vec<String>>,
}

#[async_trait]
impl PasteStore for RecordingServices {
    async fn store(&self, contents: &str, _description: &str) -> Result<String, NotifyError> {
        self.stored.lock().unwrap().push(contents.to_string());
        Ok("https://gist.github.com/deadbeef".to_string())
    }
}

#[async_trait]
impl UrlShortener for RecordingServices {
    async fn shorten(&self, url: &str) -> Result<String, NotifyError> {
        self.shortened.lock().unwrap().push(url.to_string());
        Ok("https://sho.rt/abc".to_string())
    }
}

#[async_trait]
impl StatusPoster for RecordingServices {
    async fn post(&self, message: &str) -> Result<(), NotifyError> {
        self.posted.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

pub fn recording_notifier() -> (ErrorNotifier, Arc<RecordingServices>) {
    let services = Arc::new(RecordingServices::default());
    let notifier = ErrorNotifier::new(services.clone(), services.clone(), services.clone());
    (notifier, services)
}

/// Send a request through the app and read the whole body.
pub async fn send(app: &mut axum::Router, request: Request<Body>) -> (Response<()>, String) {
    let response = app.call(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    (
        Response::from_parts(parts, ()),
        String::from_utf8(bytes.to_vec()).unwrap(),
    )
}

/// Poll `check` until it returns true or roughly two seconds pass.
pub async fn wait_for<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
