//! Handler implementations

pub mod discard;
pub mod json;
pub mod pretty;
pub mod text;

pub use discard::DiscardHandler;
pub use json::JsonHandler;
pub use pretty::PrettyHandler;
pub use text::TextHandler;

// Re-export the trait for convenience
pub use crate::core::Handler;

use crate::core::{Severity, Sink, ToolkitError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Output encoding selected by the `format` logging option
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Line-delimited JSON (default)
    #[default]
    Json,
    /// Colorized, human-readable
    Pretty,
    /// logfmt key=value lines
    Plain,
    /// Nothing is written
    Discard,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
            LogFormat::Plain => "plain",
            LogFormat::Discard => "discard",
        }
    }

    /// Build the handler for this format on top of `sink`
    pub fn handler(&self, sink: Sink, threshold: Severity) -> Arc<dyn Handler> {
        match self {
            LogFormat::Json => Arc::new(JsonHandler::new(sink, threshold)),
            LogFormat::Pretty => Arc::new(PrettyHandler::new(sink, threshold)),
            LogFormat::Plain => Arc::new(TextHandler::new(sink, threshold)),
            LogFormat::Discard => Arc::new(DiscardHandler::new()),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = ToolkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "plain" => Ok(LogFormat::Plain),
            "discard" => Ok(LogFormat::Discard),
            other => Err(ToolkitError::UnsupportedFormat(other.to_string())),
        }
    }
}
