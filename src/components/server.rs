//! Accept loop and running-server handle shared by the network components
//!
//! Every connection is served on a task owned by the loop's `JoinSet`, so a
//! stop that runs past its deadline can cancel requests that are still in
//! flight instead of leaving them running detached.

use crate::core::{Attr, Logger, Result, ToolkitError};
use hyper::body::{Body, Incoming};
use hyper::{Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use hyper_util::service::TowerToHyperService;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tower::Service;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A server task plus the signals that drain and cancel it
#[derive(Debug)]
pub(crate) struct ServerHandle {
    local_addr: SocketAddr,
    drain: oneshot::Sender<()>,
    cancel: oneshot::Sender<()>,
    task: JoinHandle<Result<()>>,
}

impl ServerHandle {
    /// Serve `service` on `listener` from a spawned task
    ///
    /// HTTP/1 and HTTP/2 (prior knowledge, as gRPC uses) are both accepted.
    pub(crate) fn spawn<S, B>(
        listener: TcpListener,
        local_addr: SocketAddr,
        service: S,
        logger: Logger,
    ) -> Self
    where
        S: Service<Request<Incoming>, Response = Response<B>> + Clone + Send + 'static,
        S::Future: Send + 'static,
        S::Error: Into<BoxError>,
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: Into<BoxError>,
    {
        let (drain_tx, drain_rx) = oneshot::channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let task = tokio::spawn(serve(listener, service, logger, drain_rx, cancel_rx));

        Self {
            local_addr,
            drain: drain_tx,
            cancel: cancel_tx,
            task,
        }
    }

    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting, let open requests finish for up to `timeout`, then
    /// cancel whatever is still running
    ///
    /// When this returns, no connection task of the server is alive.
    pub(crate) async fn shutdown(mut self, component: &str, timeout: Duration) -> Result<()> {
        // The receiver is gone if the server already exited on its own
        let _ = self.drain.send(());

        match tokio::time::timeout(timeout, &mut self.task).await {
            Ok(Ok(result)) => result.map_err(|e| ToolkitError::close(component, e.to_string())),
            Ok(Err(join_err)) => Err(ToolkitError::close(component, join_err.to_string())),
            Err(_) => {
                let _ = self.cancel.send(());
                if self.task.await.is_err() {
                    return Err(ToolkitError::close(component, "server task failed during cancel"));
                }
                Err(ToolkitError::shutdown_timeout(component, timeout))
            }
        }
    }
}

async fn serve<S, B>(
    listener: TcpListener,
    service: S,
    logger: Logger,
    mut drain: oneshot::Receiver<()>,
    mut cancel: oneshot::Receiver<()>,
) -> Result<()>
where
    S: Service<Request<Incoming>, Response = Response<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError>,
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    let builder = Builder::new(TokioExecutor::new());
    let (closing_tx, closing_rx) = watch::channel(false);
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            _ = &mut drain => break,
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        logger.warn_with("failed to accept connection", [Attr::new("error", e.to_string())]);
                        continue;
                    }
                };

                let builder = builder.clone();
                let service = TowerToHyperService::new(service.clone());
                let mut closing = closing_rx.clone();
                let logger = logger.clone();

                connections.spawn(async move {
                    let conn = builder.serve_connection_with_upgrades(TokioIo::new(stream), service);
                    tokio::pin!(conn);

                    let result = tokio::select! {
                        result = conn.as_mut() => result,
                        _ = closing.changed() => {
                            conn.as_mut().graceful_shutdown();
                            conn.await
                        }
                    };
                    if let Err(e) = result {
                        logger.debug_with(
                            "connection closed with error",
                            [Attr::new("peer", peer.to_string()), Attr::new("error", e.to_string())],
                        );
                    }
                });
            }
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    // Stop accepting before draining
    drop(listener);
    let _ = closing_tx.send(true);

    loop {
        tokio::select! {
            joined = connections.join_next() => {
                if joined.is_none() {
                    return Ok(());
                }
            }
            _ = &mut cancel => {
                let abandoned = connections.len();
                connections.shutdown().await;
                logger.warn_with("abandoned in-flight connections", [Attr::new("connections", abandoned)]);
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::Router;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn spawn_router(router: Router) -> ServerHandle {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        ServerHandle::spawn(listener, addr, router, Logger::discard())
    }

    async fn send_get(addr: SocketAddr, path: &str) -> TcpStream {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n", path);
        stream.write_all(request.as_bytes()).await.unwrap();
        stream
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_open_requests() {
        let router = Router::new().route(
            "/work",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                "done"
            }),
        );
        let handle = spawn_router(router).await;
        let mut stream = send_get(handle.local_addr(), "/work").await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        handle.shutdown("test", Duration::from_secs(2)).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("done"));
    }

    #[tokio::test]
    async fn test_deadline_cancels_running_handlers() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let router = Router::new().route(
            "/slow",
            get(move || {
                let flag = Arc::clone(&flag);
                async move {
                    tokio::time::sleep(Duration::from_millis(400)).await;
                    flag.store(true, Ordering::SeqCst);
                    "late"
                }
            }),
        );

        let handle = spawn_router(router).await;
        let mut stream = send_get(handle.local_addr(), "/slow").await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = handle
            .shutdown("test", Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolkitError::ShutdownTimeout { .. }));

        // Well past the handler's own sleep
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(!finished.load(Ordering::SeqCst));

        let mut response = String::new();
        let _ = stream.read_to_string(&mut response).await;
        assert!(!response.contains("200 OK"));
    }

    #[tokio::test]
    async fn test_idle_server_stops_immediately() {
        let handle = spawn_router(Router::new()).await;
        let addr = handle.local_addr();

        handle.shutdown("test", Duration::from_secs(1)).await.unwrap();
        assert!(TcpStream::connect(addr).await.is_err());
    }
}
