//! HTTP server component

use super::lifecycle::{require, Component, Lifecycle, LifecycleState};
use super::server::ServerHandle;
use crate::core::{Attr, Logger, Result, ToolkitError};
use async_trait::async_trait;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;

const NAME: &str = "http_server";

fn default_read_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_write_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_idle_timeout() -> Duration {
    Duration::from_secs(15)
}

pub(crate) fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

/// `http` configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Listen address, e.g. `0.0.0.0:8080`
    pub address: String,

    #[serde(default = "default_read_timeout", with = "crate::config::duration")]
    pub read_timeout: Duration,

    #[serde(default = "default_write_timeout", with = "crate::config::duration")]
    pub write_timeout: Duration,

    /// Accepted for compatibility; keep-alive idling is left to hyper's defaults
    #[serde(default = "default_idle_timeout", with = "crate::config::duration")]
    pub idle_timeout: Duration,

    #[serde(default = "default_shutdown_timeout", with = "crate::config::duration")]
    pub shutdown_timeout: Duration,
}

impl HttpConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            read_timeout: default_read_timeout(),
            write_timeout: default_write_timeout(),
            idle_timeout: default_idle_timeout(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }

    /// Upper bound on handling one request; zero when both parts are disabled
    pub fn request_timeout(&self) -> Duration {
        self.read_timeout + self.write_timeout
    }
}

/// Router answering `GET /health` with `ok`
pub fn health_router() -> Router {
    Router::new().route("/health", get(|| async { "ok" }))
}

/// Serves an `axum::Router` on a spawned task while running
pub struct HttpServer {
    config: HttpConfig,
    logger: Logger,
    router: Router,
    lifecycle: Lifecycle<ServerHandle>,
}

impl HttpServer {
    pub fn new(config: Option<HttpConfig>, logger: Option<Logger>, router: Router) -> Result<Self> {
        let (config, logger) = require(NAME, config, logger)?;
        if config.address.trim().is_empty() {
            return Err(ToolkitError::config(NAME, "`address` must not be empty"));
        }

        Ok(Self {
            config,
            logger: logger.with_attr("component", NAME),
            router,
            lifecycle: Lifecycle::new(),
        })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Bound address while running
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lifecycle.resource().map(ServerHandle::local_addr)
    }

    #[allow(deprecated)]
    fn app(&self) -> Router {
        let timeout = self.config.request_timeout();
        if timeout.is_zero() {
            self.router.clone()
        } else {
            self.router.clone().layer(TimeoutLayer::new(timeout))
        }
    }
}

#[async_trait]
impl Component for HttpServer {
    fn name(&self) -> &str {
        NAME
    }

    fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    async fn start(&mut self) -> Result<()> {
        self.lifecycle.ensure_created(NAME)?;

        let address = self.config.address.clone();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| ToolkitError::bind(NAME, address.as_str(), e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ToolkitError::bind(NAME, address.as_str(), e))?;

        let handle = ServerHandle::spawn(listener, local_addr, self.app(), self.logger.clone());
        self.lifecycle.set_running(handle);
        self.logger
            .info_with("server started", [Attr::new("address", local_addr.to_string())]);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.lifecycle.begin_stop() else {
            return Ok(());
        };

        self.logger.info("shutting down server");
        let result = handle.shutdown(NAME, self.config.shutdown_timeout).await;
        match result {
            Ok(()) => self.logger.info("server stopped"),
            Err(ref e) => self
                .logger
                .warn_with("server stopped with error", [Attr::new("error", e.to_string())]),
        }
        result
    }
}
