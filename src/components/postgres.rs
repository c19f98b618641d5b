//! PostgreSQL database component

use super::lifecycle::{require, Component, Lifecycle, LifecycleState};
use crate::core::{Attr, Logger, Result, ToolkitError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};

const NAME: &str = "postgres";

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_sslmode() -> String {
    "disable".to_string()
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

/// `postgres` configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostgresConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub user: String,

    #[serde(default)]
    pub password: String,

    pub dbname: String,

    /// `disable` or `prefer`; TLS is not negotiated
    #[serde(default = "default_sslmode")]
    pub sslmode: String,

    #[serde(default = "default_connect_timeout", with = "crate::config::duration")]
    pub connect_timeout: Duration,
}

impl PostgresConfig {
    pub fn new(user: impl Into<String>, dbname: impl Into<String>) -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: user.into(),
            password: String::new(),
            dbname: dbname.into(),
            sslmode: default_sslmode(),
            connect_timeout: default_connect_timeout(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(ToolkitError::config(NAME, "`host` must not be empty"));
        }
        if self.user.is_empty() {
            return Err(ToolkitError::config(NAME, "`user` must not be empty"));
        }
        if self.dbname.is_empty() {
            return Err(ToolkitError::config(NAME, "`dbname` must not be empty"));
        }
        match self.sslmode.as_str() {
            "disable" | "prefer" => Ok(()),
            other => Err(ToolkitError::config(
                NAME,
                format!("unsupported sslmode '{}'", other),
            )),
        }
    }

    /// Connection string in libpq key=value form
    pub fn dsn(&self) -> String {
        let mut dsn = format!(
            "host={} port={} user={} password={} dbname={} sslmode={}",
            quote(&self.host),
            self.port,
            quote(&self.user),
            quote(&self.password),
            quote(&self.dbname),
            quote(&self.sslmode),
        );
        if !self.connect_timeout.is_zero() {
            dsn.push_str(&format!(" connect_timeout={}", self.connect_timeout.as_secs().max(1)));
        }
        dsn
    }
}

/// Quote a libpq value when it is empty or contains spaces or quotes
fn quote(value: &str) -> String {
    if !value.is_empty() && !value.contains([' ', '\'', '\\']) {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

/// Client plus the task driving its socket
struct Connection {
    client: Client,
    driver: JoinHandle<std::result::Result<(), tokio_postgres::Error>>,
}

/// Owns one PostgreSQL connection while running
pub struct PostgresComponent {
    config: PostgresConfig,
    logger: Logger,
    lifecycle: Lifecycle<Connection>,
}

impl PostgresComponent {
    pub fn new(config: Option<PostgresConfig>, logger: Option<Logger>) -> Result<Self> {
        let (config, logger) = require(NAME, config, logger)?;
        config.validate()?;

        Ok(Self {
            config,
            logger: logger.with_attr("component", NAME),
            lifecycle: Lifecycle::new(),
        })
    }

    pub fn config(&self) -> &PostgresConfig {
        &self.config
    }

    /// The connected client
    pub fn client(&self) -> Result<&Client> {
        self.lifecycle
            .resource()
            .map(|conn| &conn.client)
            .ok_or_else(|| ToolkitError::invalid_state(NAME, "query", self.lifecycle.state()))
    }

    async fn connect(&self) -> Result<Connection> {
        let (client, connection) = tokio_postgres::connect(&self.config.dsn(), NoTls)
            .await
            .map_err(|e| ToolkitError::connection(NAME, "failed to connect", e))?;
        let driver = tokio::spawn(connection);

        if let Err(e) = client.simple_query("SELECT 1").await {
            driver.abort();
            return Err(ToolkitError::connection(NAME, "failed to ping database", e));
        }

        Ok(Connection { client, driver })
    }
}

#[async_trait]
impl Component for PostgresComponent {
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
            [
                Attr::new("host", self.config.host.as_str()),
                Attr::new("port", self.config.port),
                Attr::new("dbname", self.config.dbname.as_str()),
            ],
        );

        let conn = self.connect().await.inspect_err(|e| {
            self.logger
                .error_with("failed to connect to database", [Attr::new("error", e.to_string())])
        })?;

        self.lifecycle.set_running(conn);
        self.logger.info("successfully connected to database");
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(Connection { client, driver }) = self.lifecycle.begin_stop() else {
            return Ok(());
        };

        self.logger.info("closing database connection");
        // Dropping the last client makes the driver terminate the session
        drop(client);

        match driver.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ToolkitError::close(
                NAME,
                format!("failed to close database connection: {}", e),
            )),
            Err(e) => Err(ToolkitError::close(NAME, e.to_string())),
        }
    }
}
