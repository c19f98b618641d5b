//! JSON handler for structured logging

use crate::core::handler::AttrScopes;
use crate::core::{Attr, Handler, Record, Result, Severity, Sink};
use chrono::SecondsFormat;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::sync::Arc;

/// Writes each record as a single-line JSON object (JSONL format)
///
/// Field order is `time`, `level`, `msg`, then accumulated attributes, then
/// record attributes. Duplicate keys are written as they were added.
#[derive(Debug, Clone)]
pub struct JsonHandler {
    sink: Sink,
    threshold: Severity,
    scopes: AttrScopes,
}

struct JsonLine<'a> {
    record: &'a Record,
    attrs: &'a [Attr],
}

impl Serialize for JsonLine<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(
            "time",
            &self.record.time.to_rfc3339_opts(SecondsFormat::Millis, true),
        )?;
        map.serialize_entry("level", &self.record.severity.to_string())?;
        map.serialize_entry("msg", &self.record.message)?;
        for attr in self.attrs.iter().filter(|a| !a.value.is_empty_group()) {
            map.serialize_entry(&attr.key, &attr.value)?;
        }
        map.end()
    }
}

impl JsonHandler {
    pub fn new(sink: Sink, threshold: Severity) -> Self {
        Self {
            sink,
            threshold,
            scopes: AttrScopes::new(),
        }
    }

    /// Render a record to the exact bytes written on the sink
    pub fn render(&self, record: &Record) -> Result<String> {
        let attrs = self.scopes.resolve(&record.attrs);
        let mut line = serde_json::to_string(&JsonLine {
            record,
            attrs: &attrs,
        })?;
        line.push('\n');
        Ok(line)
    }
}

impl Handler for JsonHandler {
    fn handle(&self, record: &Record) -> Result<()> {
        let line = self.render(record)?;
        self.sink.write_record(line.as_bytes())
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler> {
        Arc::new(Self {
            sink: self.sink.clone(),
            threshold: self.threshold,
            scopes: self.scopes.with_attrs(attrs),
        })
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        Arc::new(Self {
            sink: self.sink.clone(),
            threshold: self.threshold,
            scopes: self.scopes.with_group(name),
        })
    }

    fn enabled(&self, severity: Severity) -> bool {
        severity >= self.threshold
    }

    fn name(&self) -> &str {
        "json"
    }
}
