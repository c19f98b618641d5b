//! Byte destinations shared by handlers
//!
//! A [`Sink`] serializes concurrent writers itself: every rendered record is
//! written and flushed inside one critical section, so handlers never lock.

use super::error::{Result, ToolkitError};
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

struct SinkInner {
    name: String,
    writer: Mutex<Box<dyn Write + Send>>,
}

/// Cheaply cloneable handle to a shared writer
#[derive(Clone)]
pub struct Sink {
    inner: Arc<SinkInner>,
    color: bool,
}

impl Sink {
    /// Wrap an arbitrary writer; color output is off
    pub fn new<W: Write + Send + 'static>(name: impl Into<String>, writer: W) -> Self {
        Self::build(name.into(), false, Box::new(writer))
    }

    /// Process standard output, color-capable when attached to a terminal
    pub fn stdout() -> Self {
        let color = io::stdout().is_terminal();
        Self::build("stdout".to_string(), color, Box::new(io::stdout()))
    }

    /// Process standard error, color-capable when attached to a terminal
    pub fn stderr() -> Self {
        let color = io::stderr().is_terminal();
        Self::build("stderr".to_string(), color, Box::new(io::stderr()))
    }

    /// Override color capability detection; the destination stays shared
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn build(name: String, color: bool, writer: Box<dyn Write + Send>) -> Self {
        Self {
            inner: Arc::new(SinkInner {
                name,
                writer: Mutex::new(writer),
            }),
            color,
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn supports_color(&self) -> bool {
        self.color
    }

    /// Write one rendered record and flush it
    pub fn write_record(&self, bytes: &[u8]) -> Result<()> {
        let mut writer = self.inner.writer.lock();
        writer.write_all(bytes).map_err(|e| {
            ToolkitError::io_operation("writing log record", format!("sink '{}'", self.inner.name), e)
        })?;
        writer.flush().map_err(|e| {
            ToolkitError::io_operation("flushing log record", format!("sink '{}'", self.inner.name), e)
        })
    }

    pub fn flush(&self) -> Result<()> {
        self.inner.writer.lock().flush()?;
        Ok(())
    }

    /// Whether two handles point at the same underlying writer
    pub fn same_destination(&self, other: &Sink) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("name", &self.inner.name)
            .field("color", &self.color)
            .finish()
    }
}

/// In-memory writer whose contents stay readable after it is handed to a sink
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.lock().is_empty()
    }

    pub fn clear(&self) {
        self.bytes.lock().clear();
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
