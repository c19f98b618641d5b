//! Resource-owning components sharing one start/stop contract

pub mod grpc;
pub mod http;
pub mod lifecycle;
pub mod postgres;
mod server;
pub mod sqlite;

pub use grpc::{GrpcConfig, GrpcServer, Registration};
pub use http::{HttpConfig, HttpServer};
pub use lifecycle::{Component, Lifecycle, LifecycleState};
pub use postgres::{PostgresComponent, PostgresConfig};
pub use sqlite::{SqliteComponent, SqliteConfig};

use crate::config::AppConfig;
use crate::core::{Attr, Logger, Result};

/// Build every component whose configuration section is present
///
/// Order is sqlite, postgres, grpc, http: databases come up before the
/// servers that depend on them.
pub fn from_config(config: &AppConfig, logger: &Logger) -> Result<Vec<Box<dyn Component>>> {
    let mut components: Vec<Box<dyn Component>> = Vec::new();

    if let Some(ref sqlite) = config.sqlite {
        components.push(Box::new(SqliteComponent::new(
            Some(sqlite.clone()),
            Some(logger.clone()),
        )?));
    }
    if let Some(ref postgres) = config.postgres {
        components.push(Box::new(PostgresComponent::new(
            Some(postgres.clone()),
            Some(logger.clone()),
        )?));
    }
    if let Some(ref grpc) = config.grpc {
        components.push(Box::new(GrpcServer::new(
            Some(grpc.clone()),
            Some(logger.clone()),
            Vec::new(),
        )?));
    }
    if let Some(ref http) = config.http {
        components.push(Box::new(HttpServer::new(
            Some(http.clone()),
            Some(logger.clone()),
            http::health_router(),
        )?));
    }

    Ok(components)
}

/// Start components in order
///
/// On the first failure the already-started components are stopped in
/// reverse order and the start error is returned.
pub async fn start_all(
    components: Vec<Box<dyn Component>>,
    logger: &Logger,
) -> Result<Vec<Box<dyn Component>>> {
    let mut started = Vec::with_capacity(components.len());

    for mut component in components {
        if let Err(e) = component.start().await {
            logger.error_with(
                "component failed to start",
                [
                    Attr::new("component", component.name()),
                    Attr::new("error", e.to_string()),
                ],
            );
            stop_all(&mut started, logger).await;
            return Err(e);
        }
        started.push(component);
    }

    Ok(started)
}

/// Stop components in reverse order, logging failures
///
/// Returns the number of components whose stop reported an error.
pub async fn stop_all(components: &mut [Box<dyn Component>], logger: &Logger) -> usize {
    let mut failures = 0;
    for component in components.iter_mut().rev() {
        if let Err(e) = component.stop().await {
            failures += 1;
            logger.warn_with(
                "component failed to stop cleanly",
                [
                    Attr::new("component", component.name()),
                    Attr::new("error", e.to_string()),
                ],
            );
        }
    }
    failures
}
