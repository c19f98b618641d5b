//! Configuration loading

pub mod duration;
pub mod loader;
pub mod schema;

pub use loader::{load_from_file, load_from_str};
pub use schema::{AppConfig, LoggingConfig};
