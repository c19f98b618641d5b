//! # Ops Toolkit
//!
//! Structured logging with pluggable encodings, plus database and network
//! components that share one start/stop lifecycle.
//!
//! ## Features
//!
//! - **Handlers**: JSON lines, logfmt text, colorized pretty output, discard
//! - **Derivation**: `Logger::with` / `Logger::with_group` never mutate the parent
//! - **Sinks**: stdout, stderr or a size-rotated file with gzip backups
//! - **Components**: SQLite, PostgreSQL, HTTP (axum) and gRPC (tonic) servers
//!
//! ```
//! use ops_toolkit::prelude::*;
//!
//! let buffer = CaptureBuffer::new();
//! let logger = Logger::builder()
//!     .format("json")
//!     .sink(Sink::new("memory", buffer.clone()))
//!     .build()
//!     .unwrap()
//!     .with_attr("component", "postgres");
//!
//! logger.info_with("connected", [Attr::new("pool", 4)]);
//! assert!(buffer.contents().contains(r#""component":"postgres","pool":4"#));
//! ```

pub mod components;
pub mod config;
pub mod core;
pub mod handlers;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::components::{Component, LifecycleState};
    pub use crate::config::{AppConfig, LoggingConfig};
    pub use crate::core::{
        Attr, CaptureBuffer, Handler, Logger, LoggerBuilder, LoggerMetrics, Record, Result,
        Severity, Sink, ToolkitError, Value,
    };
    pub use crate::handlers::LogFormat;
    pub use crate::sinks::RotationConfig;
}

pub use core::{
    Attr, CaptureBuffer, ErrorCallback, Handler, Logger, LoggerBuilder, LoggerMetrics, Record,
    Result, Severity, Sink, ToolkitError, Value,
};
pub use handlers::{DiscardHandler, JsonHandler, LogFormat, PrettyHandler, TextHandler};
