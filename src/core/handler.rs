//! Handler trait for rendering records onto a sink

use super::{attribute::Attr, error::Result, record::Record, severity::Severity};
use std::fmt;
use std::sync::Arc;

/// Turns records into bytes on a destination
///
/// Handlers are immutable values. Deriving operations return a new handler
/// that shares the receiver's sink and threshold.
pub trait Handler: Send + Sync + fmt::Debug {
    /// Render `record` together with the accumulated attributes and write it
    fn handle(&self, record: &Record) -> Result<()>;

    /// Receiver's attributes followed by `attrs`, in order
    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler>;

    /// Namespace subsequent attributes under `name`
    fn with_group(&self, name: &str) -> Arc<dyn Handler>;

    /// Whether a record at `severity` would be rendered
    fn enabled(&self, severity: Severity) -> bool;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq)]
struct Scope {
    name: String,
    attrs: Vec<Attr>,
}

/// Accumulated attributes split by open groups
///
/// The first scope is the unnamed root. Attributes always land in the
/// innermost scope, and record attributes are nested there too.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AttrScopes {
    scopes: Vec<Scope>,
}

impl AttrScopes {
    pub(crate) fn new() -> Self {
        Self {
            scopes: vec![Scope {
                name: String::new(),
                attrs: Vec::new(),
            }],
        }
    }

    pub(crate) fn with_attrs(&self, attrs: Vec<Attr>) -> Self {
        let mut next = self.clone();
        if let Some(last) = next.scopes.last_mut() {
            last.attrs.extend(attrs);
        }
        next
    }

    pub(crate) fn with_group(&self, name: &str) -> Self {
        let mut next = self.clone();
        if !name.is_empty() {
            next.scopes.push(Scope {
                name: name.to_string(),
                attrs: Vec::new(),
            });
        }
        next
    }

    /// Build the attribute tree for one record, innermost scope first
    pub(crate) fn resolve(&self, record_attrs: &[Attr]) -> Vec<Attr> {
        let mut inner: Vec<Attr> = Vec::new();
        for (depth, scope) in self.scopes.iter().enumerate().rev() {
            let mut level = scope.attrs.clone();
            if depth + 1 == self.scopes.len() {
                level.extend(record_attrs.iter().cloned());
            } else {
                let child = &self.scopes[depth + 1];
                if !inner.is_empty() {
                    level.push(Attr::group(child.name.clone(), inner));
                }
            }
            inner = level;
        }
        inner
    }
}

impl Default for AttrScopes {
    fn default() -> Self {
        Self::new()
    }
}
