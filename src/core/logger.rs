//! Logger facade over a handler

use super::{
    attribute::{Attr, Value},
    error::{Result, ToolkitError},
    handler::Handler,
    metrics::LoggerMetrics,
    record::Record,
    severity::Severity,
    sink::Sink,
};
use crate::config::LoggingConfig;
use crate::handlers::{DiscardHandler, LogFormat};
use crate::sinks::{resolve_sink, RotationConfig};
use std::fmt;
use std::sync::Arc;

/// Callback invoked when a handler fails to write a record
pub type ErrorCallback = Arc<dyn Fn(&ToolkitError) + Send + Sync>;

/// Binds a handler and exposes level-gated emit operations
///
/// Cloning is cheap. Derived loggers ([`Logger::with`], [`Logger::with_group`])
/// get a new handler value that shares the sink, the metrics and the error
/// callback with their parent; the parent is left untouched.
///
/// Write failures never reach the caller of [`Logger::log`]. They are counted
/// in [`LoggerMetrics`] and passed to the error callback, or printed to stderr
/// when no callback is set. Use [`Logger::try_log`] to observe them directly.
#[derive(Clone)]
pub struct Logger {
    handler: Arc<dyn Handler>,
    metrics: Arc<LoggerMetrics>,
    on_error: Option<ErrorCallback>,
}

impl Logger {
    #[must_use]
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self {
            handler,
            metrics: Arc::new(LoggerMetrics::new()),
            on_error: None,
        }
    }

    /// Logger that drops everything
    #[must_use]
    pub fn discard() -> Self {
        Self::new(Arc::new(DiscardHandler::new()))
    }

    /// Build a logger from the `logging` configuration section
    pub fn from_config(config: &LoggingConfig) -> Result<Self> {
        Logger::builder()
            .level(config.level)
            .format(&config.format)
            .output(&config.output)
            .rotation(config.rotation.clone())
            .build()
    }

    /// Set the callback that receives write failures
    #[must_use]
    pub fn with_error_callback(mut self, callback: ErrorCallback) -> Self {
        self.on_error = Some(callback);
        self
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Metrics shared with every logger derived from this one
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    #[inline]
    pub fn enabled(&self, severity: Severity) -> bool {
        self.handler.enabled(severity)
    }

    /// Derive a logger whose records all carry `attrs`
    #[must_use]
    pub fn with(&self, attrs: impl IntoIterator<Item = Attr>) -> Self {
        let attrs: Vec<Attr> = attrs.into_iter().collect();
        if attrs.is_empty() {
            return self.clone();
        }
        self.derive(self.handler.with_attrs(attrs))
    }

    /// Derive a logger with a single extra attribute
    #[must_use]
    pub fn with_attr(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with([Attr::new(key, value)])
    }

    /// Derive a logger whose later attributes are namespaced under `name`
    #[must_use]
    pub fn with_group(&self, name: &str) -> Self {
        if name.is_empty() {
            return self.clone();
        }
        self.derive(self.handler.with_group(name))
    }

    fn derive(&self, handler: Arc<dyn Handler>) -> Self {
        Self {
            handler,
            metrics: Arc::clone(&self.metrics),
            on_error: self.on_error.clone(),
        }
    }

    /// Emit a record, surfacing the write error to the caller
    ///
    /// Records below the handler's threshold are skipped without being built.
    pub fn try_log(
        &self,
        severity: Severity,
        message: impl Into<String>,
        attrs: impl IntoIterator<Item = Attr>,
    ) -> Result<()> {
        self.emit(severity, || Record::new(severity, message).with_attrs(attrs))
    }

    fn emit(&self, severity: Severity, build: impl FnOnce() -> Record) -> Result<()> {
        if !self.handler.enabled(severity) {
            self.metrics.record_filtered();
            return Ok(());
        }

        match self.handler.handle(&build()) {
            Ok(()) => {
                self.metrics.record_logged();
                Ok(())
            }
            Err(e) => {
                self.metrics.record_failed();
                Err(e)
            }
        }
    }

    /// Entry point for the logging macros; formats only when enabled
    #[doc(hidden)]
    pub fn log_fmt(
        &self,
        severity: Severity,
        args: fmt::Arguments<'_>,
        attrs: impl FnOnce() -> Vec<Attr>,
    ) {
        let result = self.emit(severity, || {
            Record::new(severity, fmt::format(args)).with_attrs(attrs())
        });
        if let Err(e) = result {
            self.report(&e);
        }
    }

    /// Emit a record with attributes; write failures are reported out of band
    pub fn log_with(
        &self,
        severity: Severity,
        message: impl Into<String>,
        attrs: impl IntoIterator<Item = Attr>,
    ) {
        if let Err(e) = self.try_log(severity, message, attrs) {
            self.report(&e);
        }
    }

    pub fn log(&self, severity: Severity, message: impl Into<String>) {
        self.log_with(severity, message, std::iter::empty());
    }

    fn report(&self, error: &ToolkitError) {
        match self.on_error {
            Some(ref callback) => callback(error),
            None => eprintln!(
                "[LOGGER ERROR] Handler '{}' failed: {}",
                self.handler.name(),
                error
            ),
        }
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(Severity::DEBUG, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(Severity::INFO, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(Severity::WARN, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(Severity::ERROR, message);
    }

    pub fn debug_with(&self, message: impl Into<String>, attrs: impl IntoIterator<Item = Attr>) {
        self.log_with(Severity::DEBUG, message, attrs);
    }

    pub fn info_with(&self, message: impl Into<String>, attrs: impl IntoIterator<Item = Attr>) {
        self.log_with(Severity::INFO, message, attrs);
    }

    pub fn warn_with(&self, message: impl Into<String>, attrs: impl IntoIterator<Item = Attr>) {
        self.log_with(Severity::WARN, message, attrs);
    }

    pub fn error_with(&self, message: impl Into<String>, attrs: impl IntoIterator<Item = Attr>) {
        self.log_with(Severity::ERROR, message, attrs);
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use ops_toolkit::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .level(Severity::INFO)
    ///     .format("discard")
    ///     .build()
    ///     .unwrap();
    /// assert!(!logger.enabled(Severity::ERROR));
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("handler", &self.handler)
            .field("has_error_callback", &self.on_error.is_some())
            .finish()
    }
}

/// Builder for constructing a Logger from logging options
///
/// Defaults: level DEBUG, format `json`, output `stdout`.
pub struct LoggerBuilder {
    level: Severity,
    format: String,
    output: String,
    rotation: RotationConfig,
    sink: Option<Sink>,
    on_error: Option<ErrorCallback>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            level: Severity::DEBUG,
            format: LogFormat::default().to_string(),
            output: "stdout".to_string(),
            rotation: RotationConfig::default(),
            sink: None,
            on_error: None,
        }
    }

    /// Set the minimum severity
    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: impl Into<Severity>) -> Self {
        self.level = level.into();
        self
    }

    /// Set the output format (`json`, `pretty`, `plain` or `discard`)
    #[must_use = "builder methods return a new value"]
    pub fn format(mut self, format: &str) -> Self {
        self.format = format.to_string();
        self
    }

    /// Set the output destination: `stdout`, `stderr` or a file path
    #[must_use = "builder methods return a new value"]
    pub fn output(mut self, output: &str) -> Self {
        self.output = output.to_string();
        self
    }

    /// Set the rotation policy used when the output is a file
    #[must_use = "builder methods return a new value"]
    pub fn rotation(mut self, rotation: RotationConfig) -> Self {
        self.rotation = rotation;
        self
    }

    /// Write to an explicit sink instead of resolving `output`
    #[must_use = "builder methods return a new value"]
    pub fn sink(mut self, sink: Sink) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn on_error(mut self, callback: ErrorCallback) -> Self {
        self.on_error = Some(callback);
        self
    }

    /// Build the Logger
    ///
    /// The format is validated before the output is resolved, so an unknown
    /// format never creates log directories. The `discard` format resolves no
    /// output at all.
    pub fn build(self) -> Result<Logger> {
        let format: LogFormat = self.format.parse()?;

        let handler = match (format, self.sink) {
            (LogFormat::Discard, _) => format.handler(Sink::new("discard", std::io::sink()), self.level),
            (_, Some(sink)) => format.handler(sink, self.level),
            (_, None) => format.handler(resolve_sink(&self.output, &self.rotation)?, self.level),
        };

        let logger = Logger::new(handler);
        Ok(match self.on_error {
            Some(callback) => logger.with_error_callback(callback),
            None => logger,
        })
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
