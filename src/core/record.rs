//! Log record structure

use super::attribute::Attr;
use super::severity::Severity;
use chrono::{DateTime, FixedOffset, Local};

/// A single log event, created once per emit call and consumed by one handler
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Event time in the zone the caller's clock reports
    pub time: DateTime<FixedOffset>,
    pub severity: Severity,
    pub message: String,
    pub attrs: Vec<Attr>,
}

impl Record {
    /// Create a record stamped with the local wall clock
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self::at(Local::now().fixed_offset(), severity, message)
    }

    /// Create a record with an explicit timestamp
    pub fn at(time: DateTime<FixedOffset>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            time,
            severity,
            message: message.into(),
            attrs: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<super::attribute::Value>) -> Self {
        self.attrs.push(Attr::new(key, value));
        self
    }

    pub fn with_attrs(mut self, attrs: impl IntoIterator<Item = Attr>) -> Self {
        self.attrs.extend(attrs);
        self
    }
}
