//! Core logging types and traits

pub mod attribute;
pub mod error;
pub mod handler;
pub mod logger;
pub mod metrics;
pub mod record;
pub mod severity;
pub mod sink;

pub use attribute::{Attr, Value};
pub use error::{Result, ToolkitError};
pub use handler::Handler;
pub use logger::{ErrorCallback, Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use record::Record;
pub use severity::Severity;
pub use sink::{CaptureBuffer, Sink};
