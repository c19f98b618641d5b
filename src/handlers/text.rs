//! Plain key=value text handler

use crate::core::handler::AttrScopes;
use crate::core::{Attr, Handler, Record, Result, Severity, Sink, Value};
use chrono::SecondsFormat;
use std::sync::Arc;

/// Writes each record as one logfmt line
///
/// Example: `time=2025-01-08T10:30:45.123Z level=INFO msg="Request processed" status=200`
///
/// Groups flatten into dotted keys (`request.method=GET`).
#[derive(Debug, Clone)]
pub struct TextHandler {
    sink: Sink,
    threshold: Severity,
    scopes: AttrScopes,
}

impl TextHandler {
    pub fn new(sink: Sink, threshold: Severity) -> Self {
        Self {
            sink,
            threshold,
            scopes: AttrScopes::new(),
        }
    }

    /// Render a record to the exact bytes written on the sink
    pub fn render(&self, record: &Record) -> String {
        let mut parts = vec![
            format!("time={}", record.time.to_rfc3339_opts(SecondsFormat::Millis, true)),
            format!("level={}", record.severity),
            format!("msg={}", escape_value(&record.message)),
        ];

        for attr in self.scopes.resolve(&record.attrs) {
            push_attr(&mut parts, "", &attr);
        }

        let mut line = parts.join(" ");
        line.push('\n');
        line
    }
}

fn push_attr(parts: &mut Vec<String>, prefix: &str, attr: &Attr) {
    let key = if prefix.is_empty() {
        escape_key(&attr.key)
    } else {
        format!("{}.{}", prefix, escape_key(&attr.key))
    };

    match &attr.value {
        Value::Group(children) => {
            // An unnamed group inlines its children
            let prefix = if attr.key.is_empty() { prefix } else { key.as_str() };
            for child in children {
                push_attr(parts, prefix, child);
            }
        }
        Value::String(s) => parts.push(format!("{}={}", key, escape_value(s))),
        other => parts.push(format!("{}={}", key, escape_value(&other.to_string()))),
    }
}

const BAD_KEY: &str = "!BADKEY";

/// Replace characters that would need quoting with `_`
fn escape_key(key: &str) -> String {
    if key.is_empty() {
        return BAD_KEY.to_string();
    }
    key.chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') { c } else { '_' })
        .collect()
}

/// Quote a value if it contains whitespace, quotes or `=`
fn escape_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '=' || c.is_control());
    if needs_quotes {
        // Debug formatting escapes quotes, backslashes and control characters
        format!("{:?}", value)
    } else {
        value.to_string()
    }
}

impl Handler for TextHandler {
    fn handle(&self, record: &Record) -> Result<()> {
        self.sink.write_record(self.render(record).as_bytes())
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
        "plain"
    }
}
