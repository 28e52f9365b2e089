//! Log output subsystem.
//!
//! # Data Flow
//! ```text
//! rendered line + "\n"
//!     → LogSink::Direct   → stream.rs (one write per line)
//!     → LogSink::Buffered → buffer.rs (accumulate, one write per window)
//! ```
//!
//! # Design Decisions
//! - The stream is injected; stdout is only the builder's default
//! - Write failures are logged, never returned to the request path

pub mod buffer;
pub mod stream;

pub use buffer::{BufferedSink, DEFAULT_FLUSH_INTERVAL};
pub use stream::{MemoryStream, StreamSink, StreamTarget};

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Buffering mode for the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Buffer {
    #[default]
    Off,
    /// Buffer with [`DEFAULT_FLUSH_INTERVAL`].
    Default,
    Interval(Duration),
}

impl Buffer {
    pub fn interval(&self) -> Option<Duration> {
        match self {
            Buffer::Off => None,
            Buffer::Default => Some(DEFAULT_FLUSH_INTERVAL),
            Buffer::Interval(interval) => Some(*interval),
        }
    }
}

/// `buffer` as written in the config file: `false`, `true` or milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum BufferSetting {
    Enabled(bool),
    Millis(u64),
}

impl Default for BufferSetting {
    fn default() -> Self {
        BufferSetting::Enabled(false)
    }
}

impl From<BufferSetting> for Buffer {
    fn from(setting: BufferSetting) -> Self {
        match setting {
            BufferSetting::Enabled(false) | BufferSetting::Millis(0) => Buffer::Off,
            BufferSetting::Enabled(true) => Buffer::Default,
            BufferSetting::Millis(ms) => Buffer::Interval(Duration::from_millis(ms)),
        }
    }
}

/// Destination for finished log lines.
pub enum LogSink {
    Direct(StreamSink),
    Buffered(BufferedSink),
}

impl LogSink {
    pub fn new(stream: StreamSink, buffer: Buffer) -> Self {
        match buffer.interval() {
            Some(interval) => LogSink::Buffered(BufferedSink::new(stream, interval)),
            None => LogSink::Direct(stream),
        }
    }

    pub fn write(&self, line: String) {
        match self {
            LogSink::Direct(stream) => {
                if let Err(e) = stream.write(&line) {
                    tracing::warn!(error = %e, "Failed to write access log line");
                }
            }
            LogSink::Buffered(buffered) => buffered.write(line),
        }
    }

    /// Write out anything still buffered.
    pub fn flush(&self) {
        if let LogSink::Buffered(buffered) = self {
            buffered.flush();
        }
    }

    pub fn is_buffered(&self) -> bool {
        matches!(self, LogSink::Buffered(_))
    }
}
