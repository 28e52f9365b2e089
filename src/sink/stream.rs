//! Raw output streams.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// Where log lines go, as written in the config file.
///
/// `"stdout"` and `"stderr"` name the process streams; any other string is a
/// file path opened for appending.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum StreamTarget {
    #[default]
    Stdout,
    Stderr,
    File(PathBuf),
}

impl From<String> for StreamTarget {
    fn from(value: String) -> Self {
        match value.as_str() {
            "stdout" | "" => StreamTarget::Stdout,
            "stderr" => StreamTarget::Stderr,
            _ => StreamTarget::File(PathBuf::from(value)),
        }
    }
}

impl From<StreamTarget> for String {
    fn from(value: StreamTarget) -> Self {
        match value {
            StreamTarget::Stdout => "stdout".to_string(),
            StreamTarget::Stderr => "stderr".to_string(),
            StreamTarget::File(path) => path.display().to_string(),
        }
    }
}

impl StreamTarget {
    pub fn open(&self) -> io::Result<StreamSink> {
        let writer: Box<dyn Write + Send> = match self {
            StreamTarget::Stdout => Box::new(io::stdout()),
            StreamTarget::Stderr => Box::new(io::stderr()),
            StreamTarget::File(path) => {
                Box::new(OpenOptions::new().create(true).append(true).open(path)?)
            }
        };
        Ok(StreamSink::from_boxed(writer))
    }
}

/// Shared handle to the underlying writer. Each call is one `write_all`.
#[derive(Clone)]
pub struct StreamSink {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl StreamSink {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self::from_boxed(Box::new(writer))
    }

    fn from_boxed(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn write(&self, chunk: &str) -> io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log stream lock poisoned"))?;
        writer.write_all(chunk.as_bytes())?;
        writer.flush()
    }
}

impl std::fmt::Debug for StreamSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSink").finish_non_exhaustive()
    }
}

/// In-memory stream that records every write separately.
///
/// Clones share the same record, so one clone can be handed to the logger
/// and another kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemoryStream {
    writes: Arc<Mutex<Vec<String>>>,
}

impl MemoryStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write received, in order.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }

    /// Everything written, concatenated.
    pub fn contents(&self) -> String {
        self.writes().concat()
    }
}

impl Write for MemoryStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut writes = self
            .writes
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory stream lock poisoned"))?;
        writes.push(String::from_utf8_lossy(buf).into_owned());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
