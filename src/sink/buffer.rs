//! Time-windowed buffering in front of a stream.
//!
//! # Responsibilities
//! - Accumulate lines in arrival order
//! - Arm a single flush timer on the first write after a flush
//! - Write the whole window as one chunk when the timer fires
//!
//! # Design Decisions
//! - At most one timer is armed; the timer disarms itself when it fires
//! - No size-based flushing, only the time window
//! - The state lock is never held while writing to the stream
//! - Taking a window and writing it happen under one flush lock, so
//!   windows reach the stream in the order they were taken

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::observability::metrics;
use crate::sink::StreamSink;

/// Flush interval used when buffering is enabled without an explicit value.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Default)]
struct BufferState {
    pending: Vec<String>,
    timer: Option<ArmedTimer>,
    next_timer_id: u64,
}

struct ArmedTimer {
    id: u64,
    handle: JoinHandle<()>,
}

pub struct BufferedSink {
    state: Arc<Mutex<BufferState>>,
    flushing: Arc<Mutex<()>>,
    stream: StreamSink,
    interval: Duration,
}

impl BufferedSink {
    pub fn new(stream: StreamSink, interval: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(BufferState::default())),
            flushing: Arc::new(Mutex::new(())),
            stream,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Queue a line; arms the flush timer if none is armed.
    pub fn write(&self, line: String) {
        let mut state = lock(&self.state);
        state.pending.push(line);

        if state.timer.is_some() {
            return;
        }

        match Handle::try_current() {
            Ok(runtime) => {
                let id = state.next_timer_id;
                state.next_timer_id += 1;
                let handle = runtime.spawn(flush_after(
                    self.state.clone(),
                    self.flushing.clone(),
                    self.stream.clone(),
                    self.interval,
                    id,
                ));
                state.timer = Some(ArmedTimer { id, handle });
            }
            Err(_) => {
                // No runtime to drive a timer: write through.
                drop(state);
                self.flush();
            }
        }
    }

    /// Cancel the armed timer and write whatever is pending now.
    pub fn flush(&self) {
        let _flushing = lock(&self.flushing);
        let (chunk, lines) = {
            let mut state = lock(&self.state);
            if let Some(timer) = state.timer.take() {
                timer.handle.abort();
            }
            take_pending(&mut state)
        };
        write_chunk(&self.stream, &chunk, lines);
    }

    /// Lines waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.state.lock().map(|s| s.pending.len()).unwrap_or_default()
    }

    pub fn is_armed(&self) -> bool {
        self.state.lock().map(|s| s.timer.is_some()).unwrap_or_default()
    }
}

impl Drop for BufferedSink {
    fn drop(&mut self) {
        self.flush();
    }
}

async fn flush_after(
    state: Arc<Mutex<BufferState>>,
    flushing: Arc<Mutex<()>>,
    stream: StreamSink,
    interval: Duration,
    id: u64,
) {
    tokio::time::sleep(interval).await;

    let _flushing = lock(&flushing);
    let (chunk, lines) = {
        let mut state = lock(&state);
        // Superseded by an explicit flush and a newer timer.
        if state.timer.as_ref().map(|t| t.id) != Some(id) {
            return;
        }
        state.timer = None;
        take_pending(&mut state)
    };
    write_chunk(&stream, &chunk, lines);
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn take_pending(state: &mut BufferState) -> (String, usize) {
    let lines = state.pending.len();
    let chunk = state.pending.concat();
    state.pending.clear();
    (chunk, lines)
}

fn write_chunk(stream: &StreamSink, chunk: &str, lines: usize) {
    if chunk.is_empty() {
        return;
    }
    match stream.write(chunk) {
        Ok(()) => metrics::record_flush(lines),
        Err(e) => tracing::warn!(error = %e, lines, "Failed to flush buffered access log"),
    }
}
