//! SQLite database component

use super::lifecycle::{require, Component, Lifecycle, LifecycleState};
use crate::core::{Attr, Logger, Result, ToolkitError};
use async_trait::async_trait;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const NAME: &str = "sqlite";

/// `sqlite` configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Database file; `:memory:` opens a private in-memory database
    pub file_path: String,

    /// `PRAGMA cache_size`; 0 keeps the SQLite default
    #[serde(default)]
    pub cache_size: i64,

    /// Enable `PRAGMA foreign_keys`
    #[serde(default)]
    pub foreign_keys: bool,

    /// How long a locked database is retried before failing; 0 disables
    #[serde(default, with = "crate::config::duration")]
    pub busy_timeout: Duration,
}

impl SqliteConfig {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            cache_size: 0,
            foreign_keys: false,
            busy_timeout: Duration::ZERO,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.file_path.trim().is_empty() {
            return Err(ToolkitError::config(NAME, "`file_path` must not be empty"));
        }
        Ok(())
    }
}

/// Owns one SQLite connection while running
pub struct SqliteComponent {
    config: SqliteConfig,
    logger: Logger,
    lifecycle: Lifecycle<Connection>,
}

impl SqliteComponent {
    pub fn new(config: Option<SqliteConfig>, logger: Option<Logger>) -> Result<Self> {
        let (config, logger) = require(NAME, config, logger)?;
        config.validate()?;

        Ok(Self {
            config,
            logger: logger.with_attr("component", NAME),
            lifecycle: Lifecycle::new(),
        })
    }

    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// Run `f` against the open connection
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> T) -> Result<T> {
        self.lifecycle
            .resource()
            .map(f)
            .ok_or_else(|| ToolkitError::invalid_state(NAME, "query", self.lifecycle.state()))
    }
}

fn open(config: &SqliteConfig) -> Result<Connection> {
    let conn = Connection::open(&config.file_path)
        .map_err(|e| ToolkitError::connection(NAME, "failed to open database", e))?;

    if !config.busy_timeout.is_zero() {
        conn.busy_timeout(config.busy_timeout)
            .map_err(|e| ToolkitError::connection(NAME, "failed to set busy timeout", e))?;
    }

    if config.cache_size != 0 {
        conn.pragma_update(None, "cache_size", config.cache_size)
            .map_err(|e| ToolkitError::connection(NAME, "failed to set cache size", e))?;
    }

    if config.foreign_keys {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| ToolkitError::connection(NAME, "failed to enable foreign keys", e))?;
    }

    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
        .map_err(|e| ToolkitError::connection(NAME, "failed to ping database", e))?;

    Ok(conn)
}

#[async_trait]
impl Component for SqliteComponent {
    fn name(&self) -> &str {
        NAME
    }

    fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    async fn start(&mut self) -> Result<()> {
        self.lifecycle.ensure_created(NAME)?;
        self.logger.info_with(
            "connecting to database",
            [Attr::new("file", self.config.file_path.as_str())],
        );

        let config = self.config.clone();
        let conn = tokio::task::spawn_blocking(move || open(&config))
            .await
            .map_err(|e| ToolkitError::connection(NAME, "open task failed", e))?
            .inspect_err(|e| {
                self.logger
                    .error_with("failed to connect to database", [Attr::new("error", e.to_string())])
            })?;

        self.lifecycle.set_running(conn);
        self.logger.info("successfully connected to database");
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(conn) = self.lifecycle.begin_stop() else {
            return Ok(());
        };

        self.logger.info("closing database connection");
        conn.close().map_err(|(_, e)| {
            ToolkitError::close(NAME, format!("failed to close database connection: {}", e))
        })
    }
}
