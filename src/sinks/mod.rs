//! Output destinations for handlers

pub mod rotating_file;

pub use rotating_file::{RotatingFileWriter, RotationConfig};

use crate::core::{Result, Sink, ToolkitError};
use std::fs;
use std::path::Path;

/// Resolve the `output` logging option to a sink
///
/// `"stdout"` and `"stderr"` map to the process streams. Anything else is a
/// file path: its parent directory is created and the file is opened for
/// appending through a [`RotatingFileWriter`].
///
/// # Errors
///
/// Returns an IO error if the directory cannot be created or the file cannot
/// be opened.
pub fn resolve_sink(output: &str, rotation: &RotationConfig) -> Result<Sink> {
    match output {
        "stdout" => Ok(Sink::stdout()),
        "stderr" => Ok(Sink::stderr()),
        path => {
            let path = Path::new(path);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| {
                    ToolkitError::io_operation(
                        "creating log directory",
                        format!("failed to create '{}'", parent.display()),
                        e,
                    )
                })?;
            }

            let writer = RotatingFileWriter::open(path, rotation.clone())?;
            Ok(Sink::new(path.display().to_string(), writer))
        }
    }
}
