//! Human-readable, colorized handler

use crate::core::{Attr, Handler, Record, Result, Severity, Sink};
use colored::Color;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Renders `HH:MM:SS.mmm [LEVEL:] message` followed by an indented JSON block
/// of the merged attributes.
///
/// Groups are not rendered: [`Handler::with_group`] returns an equivalent
/// handler.
///
/// # Example
///
/// ```
/// use ops_toolkit::core::{CaptureBuffer, Handler, Record, Severity, Sink};
/// use ops_toolkit::handlers::PrettyHandler;
///
/// let buffer = CaptureBuffer::new();
/// let handler = PrettyHandler::new(Sink::new("memory", buffer.clone()), Severity::DEBUG);
///
/// let time = chrono::DateTime::parse_from_rfc3339("2023-01-01T12:30:45.123Z").unwrap();
/// handler.handle(&Record::at(time, Severity::INFO, "Hello")).unwrap();
/// assert_eq!(buffer.contents(), "12:30:45.123 [INFO:] Hello\n");
/// ```
#[derive(Debug, Clone)]
pub struct PrettyHandler {
    sink: Sink,
    threshold: Severity,
    attrs: Vec<Attr>,
}

impl PrettyHandler {
    pub fn new(sink: Sink, threshold: Severity) -> Self {
        Self {
            sink,
            threshold,
            attrs: Vec::new(),
        }
    }

    /// Accumulated attributes in insertion order
    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    /// Same as [`Handler::with_attrs`] without erasing the concrete type
    #[must_use]
    pub fn append_attrs(&self, attrs: Vec<Attr>) -> Self {
        let mut merged = Vec::with_capacity(self.attrs.len() + attrs.len());
        merged.extend(self.attrs.iter().cloned());
        merged.extend(attrs);
        Self {
            sink: self.sink.clone(),
            threshold: self.threshold,
            attrs: merged,
        }
    }

    fn paint(&self, text: &str, color: Option<Color>) -> String {
        match color {
            Some(color) if self.sink.supports_color() => {
                format!("\x1b[{}m{}\x1b[0m", color.to_fg_str(), text)
            }
            _ => text.to_string(),
        }
    }

    /// Render a record to the exact bytes written on the sink
    pub fn render(&self, record: &Record) -> Result<String> {
        let timestamp = self.paint(&record.time.format("%H:%M:%S%.3f").to_string(), Some(Color::Green));
        let level = self.paint(&format!("{}:", record.severity), record.severity.color_code());
        let message = self.paint(&record.message, Some(Color::Cyan));

        // Record attrs first, handler attrs second: later keys overwrite earlier
        // ones, and the map iterates in key order.
        let mut fields: BTreeMap<&str, serde_json::Value> = BTreeMap::new();
        for attr in record.attrs.iter().chain(self.attrs.iter()) {
            fields.insert(attr.key.as_str(), attr.value.to_json_value());
        }

        let mut line = format!("{} [{}] {}\n", timestamp, level, message);
        if !fields.is_empty() {
            line.push_str(&serde_json::to_string_pretty(&fields)?);
            line.push('\n');
        }
        Ok(line)
    }
}

impl Handler for PrettyHandler {
    fn handle(&self, record: &Record) -> Result<()> {
        let line = self.render(record)?;
        self.sink.write_record(line.as_bytes())
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler> {
        Arc::new(self.append_attrs(attrs))
    }

    fn with_group(&self, _name: &str) -> Arc<dyn Handler> {
        Arc::new(self.clone())
    }

    fn enabled(&self, severity: Severity) -> bool {
        severity >= self.threshold
    }

    fn name(&self) -> &str {
        "pretty"
    }
}
