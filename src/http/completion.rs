//! Response completion tracking.
//!
//! # Responsibilities
//! - Hold per-request state until the response is finalized
//! - Record the response head (status, headers) when the inner service answers
//! - Observe body frames of server errors without altering them
//! - Fire the logger exactly once, however the exchange ends
//!
//! # Design Decisions
//! - `PENDING → FINALIZED` is an `Option` taken once; a second trigger is a no-op
//! - End of stream, body error and drop all count as completion, so client
//!   aborts and dropped handler futures are still logged
//! - Body capture is a decorator over the body, bounded by [`MAX_ERROR_CAPTURE`]

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, StatusCode};
use hyper::body::{Body as HttpBody, Frame, SizeHint};

use crate::http::layer::AccessLogger;
use crate::http::{RequestContext, ResponseView};

/// Upper bound on the captured body of a server error.
pub const MAX_ERROR_CAPTURE: usize = 64 * 1024;

struct Pending {
    request: RequestContext,
    head: Option<(StatusCode, HeaderMap)>,
    capture: Option<Vec<u8>>,
    logger: Arc<AccessLogger>,
}

/// One-shot completion state for a single request.
pub(crate) struct Completion {
    pending: Option<Pending>,
}

impl Completion {
    pub(crate) fn new(request: RequestContext, logger: Arc<AccessLogger>) -> Self {
        Self {
            pending: Some(Pending {
                request,
                head: None,
                capture: None,
                logger,
            }),
        }
    }

    /// The inner service produced a response head.
    pub(crate) fn head_sent(&mut self, status: StatusCode, headers: &HeaderMap) {
        if let Some(pending) = &mut self.pending {
            if status.as_u16() > 499 {
                pending.capture = Some(Vec::new());
            }
            pending.head = Some((status, headers.clone()));
        }
    }

    /// A body chunk is about to go out.
    pub(crate) fn observe(&mut self, chunk: &[u8]) {
        if let Some(Pending { capture: Some(buf), .. }) = &mut self.pending {
            let room = MAX_ERROR_CAPTURE.saturating_sub(buf.len());
            buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
        }
    }

    /// Finalize and hand the exchange to the logger. Later calls do nothing.
    pub(crate) fn finish(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        let response = match pending.head {
            Some((status, headers)) => {
                let view = ResponseView::completed(status, headers, Instant::now());
                match pending.capture {
                    Some(body) => view.with_error_body(Bytes::from(body)),
                    None => view,
                }
            }
            None => ResponseView::unsent(),
        };

        pending.logger.log(&pending.request, &response);
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.pending.is_none()
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Response body that finalizes its request when it ends or is dropped.
pub struct LoggedBody {
    inner: Body,
    completion: Completion,
}

impl LoggedBody {
    pub(crate) fn new(inner: Body, completion: Completion) -> Self {
        Self { inner, completion }
    }
}

impl HttpBody for LoggedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;
        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.completion.observe(data);
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(e))) => {
                this.completion.finish();
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.completion.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
