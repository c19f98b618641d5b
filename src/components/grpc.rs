//! gRPC server component

use super::http::default_shutdown_timeout;
use super::lifecycle::{require, Component, Lifecycle, LifecycleState};
use super::server::ServerHandle;
use crate::core::{Attr, Logger, Result, ToolkitError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use hyper::body::Incoming;
use hyper::Request;
use tokio::net::TcpListener;
use tonic::service::{Routes, RoutesBuilder};
use tower::ServiceBuilder;

const NAME: &str = "grpc_server";

/// Registers services on the server's routing table
pub type Registration = Box<dyn FnOnce(&mut RoutesBuilder) + Send>;

/// `grpc` configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrpcConfig {
    /// Host or IP to listen on
    pub address: String,

    /// 0 picks a free port
    #[serde(default)]
    pub port: u16,

    #[serde(default = "default_shutdown_timeout", with = "crate::config::duration")]
    pub shutdown_timeout: Duration,
}

impl GrpcConfig {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            shutdown_timeout: default_shutdown_timeout(),
        }
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Serves tonic services on a spawned task while running
///
/// Interceptors are applied per service inside a registration, through the
/// `with_interceptor` constructor tonic generates for every server type.
///
/// # Example
///
/// ```no_run
/// use ops_toolkit::components::{GrpcConfig, GrpcServer, Registration};
/// use ops_toolkit::core::Logger;
/// use tonic::{Request, Status};
///
/// fn check_auth(req: Request<()>) -> Result<Request<()>, Status> {
///     match req.metadata().get("authorization") {
///         Some(token) if token == "Bearer secret" => Ok(req),
///         _ => Err(Status::unauthenticated("missing or invalid token")),
///     }
/// }
///
/// let registrations: Vec<Registration> = vec![Box::new(|routes| {
///     // With tonic-generated code for a `Greeter` service:
///     // routes.add_service(GreeterServer::with_interceptor(MyGreeter::default(), check_auth));
///     let _ = (routes, check_auth);
/// })];
/// let server = GrpcServer::new(
///     Some(GrpcConfig::new("0.0.0.0", 50051)),
///     Some(Logger::discard()),
///     registrations,
/// )
/// .unwrap();
/// ```
pub struct GrpcServer {
    config: GrpcConfig,
    logger: Logger,
    routes: Routes,
    lifecycle: Lifecycle<ServerHandle>,
}

impl GrpcServer {
    pub fn new(
        config: Option<GrpcConfig>,
        logger: Option<Logger>,
        registrations: Vec<Registration>,
    ) -> Result<Self> {
        let (config, logger) = require(NAME, config, logger)?;
        if config.address.trim().is_empty() {
            return Err(ToolkitError::config(NAME, "`address` must not be empty"));
        }

        let mut builder = Routes::builder();
        for register in registrations {
            register(&mut builder);
        }

        Ok(Self {
            config,
            logger: logger.with_attr("component", NAME),
            routes: builder.routes(),
            lifecycle: Lifecycle::new(),
        })
    }

    pub fn config(&self) -> &GrpcConfig {
        &self.config
    }

    /// Bound address while running
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lifecycle.resource().map(ServerHandle::local_addr)
    }
}

#[async_trait]
impl Component for GrpcServer {
    fn name(&self) -> &str {
        NAME
    }

    fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    async fn start(&mut self) -> Result<()> {
        self.lifecycle.ensure_created(NAME)?;

        let address = self.config.listen_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| ToolkitError::bind(NAME, address.as_str(), e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ToolkitError::bind(NAME, address.as_str(), e))?;

        // `Routes` takes tonic's boxed body; adapt the connection's body to it
        let service = ServiceBuilder::new()
            .map_request(|req: Request<Incoming>| req.map(tonic::body::boxed))
            .service(self.routes.clone());
        let handle = ServerHandle::spawn(listener, local_addr, service, self.logger.clone());
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
