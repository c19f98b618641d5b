//! No-op handler

use crate::core::{Attr, Handler, Record, Result, Severity};
use std::sync::Arc;

/// Drops every record
///
/// [`Handler::enabled`] is always false so callers can skip building records
/// altogether. Derived handlers are equivalent discard handlers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscardHandler;

impl DiscardHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Handler for DiscardHandler {
    fn handle(&self, _record: &Record) -> Result<()> {
        Ok(())
    }

    fn with_attrs(&self, _attrs: Vec<Attr>) -> Arc<dyn Handler> {
        Arc::new(*self)
    }

    fn with_group(&self, _name: &str) -> Arc<dyn Handler> {
        Arc::new(*self)
    }

    fn enabled(&self, _severity: Severity) -> bool {
        false
    }

    fn name(&self) -> &str {
        "discard"
    }
}
