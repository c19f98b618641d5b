//! Configuration file layout

use crate::components::{GrpcConfig, HttpConfig, PostgresConfig, SqliteConfig};
use crate::core::Severity;
use crate::sinks::RotationConfig;
use serde::{Deserialize, Serialize};

fn default_level() -> i32 {
    Severity::DEBUG.value()
}

fn default_format() -> String {
    "json".to_string()
}

fn default_output() -> String {
    "stdout".to_string()
}

/// `logging` configuration section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum severity as an integer (DEBUG=-4, INFO=0, WARN=4, ERROR=8)
    #[serde(default = "default_level")]
    pub level: i32,

    /// One of `json`, `pretty`, `plain`, `discard`
    #[serde(default = "default_format")]
    pub format: String,

    /// `stdout`, `stderr` or a file path
    #[serde(default = "default_output")]
    pub output: String,

    /// Applied when `output` is a file
    #[serde(default)]
    pub rotation: RotationConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
            output: default_output(),
            rotation: RotationConfig::default(),
        }
    }
}

/// Whole configuration file
///
/// Component sections are optional; a component is only run when its
/// section is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqlite: Option<SqliteConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postgres: Option<PostgresConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc: Option<GrpcConfig>,
}
