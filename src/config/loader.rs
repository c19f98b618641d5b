//! Typed YAML configuration loading

use crate::core::{Result, ToolkitError};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

const COMPONENT: &str = "config";

/// Load a configuration file into any deserializable type
///
/// # Errors
///
/// Returns a configuration error if the file does not exist, cannot be read,
/// or does not match `T` (the message names the offending field).
pub fn load_from_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ToolkitError::config(
            COMPONENT,
            format!("file does not exist: {}", path.display()),
        ));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        ToolkitError::config(COMPONENT, format!("cannot read {}: {}", path.display(), e))
    })?;
    load_from_str(&content)
}

/// Parse YAML text into any deserializable type
///
/// An empty document is treated as an empty mapping so that every field
/// falls back to its default.
pub fn load_from_str<T: DeserializeOwned>(content: &str) -> Result<T> {
    let content = if content.trim().is_empty() { "{}" } else { content };
    serde_yaml::from_str(content).map_err(|e| {
        ToolkitError::config(COMPONENT, format!("cannot read configuration: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file() {
        let err = load_from_file::<AppConfig>("/definitely/not/here.yaml").unwrap_err();
        assert!(err.to_string().contains("file does not exist"));
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AppConfig = load_from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_missing_required_field_is_named() {
        let err = load_from_str::<AppConfig>("http:\n  read_timeout: 5s\n").unwrap_err();
        assert!(matches!(err, ToolkitError::Config { .. }));
        assert!(err.to_string().contains("address"));
    }

    #[test]
    fn test_load_full_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "logging:\n  level: 0\n  format: plain\n  output: stderr\n\
             sqlite:\n  file_path: ':memory:'\n  foreign_keys: true\n\
             http:\n  address: 127.0.0.1:0\n  shutdown_timeout: 2s\n"
        )
        .unwrap();

        let config: AppConfig = load_from_file(file.path()).unwrap();
        assert_eq!(config.logging.level, 0);
        assert_eq!(config.logging.output, "stderr");
        assert!(config.sqlite.as_ref().unwrap().foreign_keys);
        assert_eq!(
            config.http.as_ref().unwrap().shutdown_timeout,
            std::time::Duration::from_secs(2)
        );
        assert!(config.postgres.is_none());
    }
}
