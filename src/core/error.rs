//! Error types for the toolkit

use std::time::Duration;

pub type Result<T> = std::result::Result<T, ToolkitError>;

#[derive(Debug, thiserror::Error)]
pub enum ToolkitError {
    /// Missing or invalid configuration
    #[error("Invalid configuration for {component}: {message}")]
    Config { component: String, message: String },

    /// Resource acquisition failed while starting a database component
    #[error("Connection failed for {component}: {message}")]
    Connection {
        component: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Listener could not be bound
    #[error("Failed to bind {component} on '{address}'")]
    Bind {
        component: String,
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Releasing a resource failed during stop
    #[error("Failed to close {component}: {message}")]
    Close { component: String, message: String },

    /// Graceful shutdown exceeded its deadline
    #[error("{component} did not shut down within {timeout:?}")]
    ShutdownTimeout { component: String, timeout: Duration },

    /// Unknown logging format
    #[error("Unsupported logger format '{0}'")]
    UnsupportedFormat(String),

    /// Lifecycle transition not allowed from the current state
    #[error("Cannot {operation} {component}: component is {state}")]
    InvalidState {
        component: String,
        operation: String,
        state: String,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ToolkitError {
    /// Create a configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        ToolkitError::Config {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a connection error with the driver error attached
    pub fn connection<E>(component: impl Into<String>, message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ToolkitError::Connection {
            component: component.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a bind error
    pub fn bind(
        component: impl Into<String>,
        address: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        ToolkitError::Bind {
            component: component.into(),
            address: address.into(),
            source,
        }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        ToolkitError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a close error
    pub fn close(component: impl Into<String>, message: impl Into<String>) -> Self {
        ToolkitError::Close {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a shutdown timeout error
    pub fn shutdown_timeout(component: impl Into<String>, timeout: Duration) -> Self {
        ToolkitError::ShutdownTimeout {
            component: component.into(),
            timeout,
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(
        component: impl Into<String>,
        operation: impl Into<String>,
        state: impl ToString,
    ) -> Self {
        ToolkitError::InvalidState {
            component: component.into(),
            operation: operation.into(),
            state: state.to_string(),
        }
    }

    /// Whether this error came from a sink write or resource release
    pub fn is_io(&self) -> bool {
        matches!(self, ToolkitError::Io(_) | ToolkitError::IoOperation { .. })
    }
}
