//! `ops-toolkit`: run the components described by a configuration file
//!
//! Exit codes: 0 after a clean shutdown on Ctrl-C or SIGTERM, 1 when the configuration or
//! the logger cannot be built, 2 when a component fails to start.

use clap::Parser;
use ops_toolkit::components;
use ops_toolkit::config::{load_from_file, AppConfig};
use ops_toolkit::core::{Attr, Logger};
use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_CONFIG: u8 = 1;
const EXIT_START: u8 = 2;

/// Run toolkit components until interrupted.
#[derive(Parser)]
#[command(name = "ops-toolkit")]
#[command(author, version, about = "Run toolkit components until interrupted")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(long, value_name = "PATH")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_CONFIG)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let config: AppConfig = match load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let logger = match Logger::from_config(&config.logging) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let components = match components::from_config(&config, &logger) {
        Ok(components) => components,
        Err(e) => {
            logger.error_with("invalid component configuration", [Attr::new("error", e.to_string())]);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let mut running = match components::start_all(components, &logger).await {
        Ok(running) => running,
        Err(_) => return ExitCode::from(EXIT_START),
    };

    let shutdown = shutdown_signal(&logger);
    logger.info_with(
        "toolkit started",
        [
            Attr::new("components", running.len()),
            Attr::new("config", args.config.display().to_string()),
        ],
    );

    shutdown.await;

    logger.info("shutting down");
    let failures = components::stop_all(&mut running, &logger).await;
    logger.info_with("shutdown complete", [Attr::new("stop_failures", failures)]);

    ExitCode::SUCCESS
}

/// Resolve on Ctrl-C, or SIGTERM on unix
///
/// The SIGTERM handler is installed before the future is returned, so a
/// signal sent as soon as startup is logged is not lost.
fn shutdown_signal(logger: &Logger) -> impl Future<Output = ()> + '_ {
    #[cfg(unix)]
    let sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(sigterm) => Some(sigterm),
        Err(e) => {
            logger.error_with("failed to install SIGTERM handler", [Attr::new("error", e.to_string())]);
            None
        }
    };

    async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                logger.error_with("failed to install Ctrl-C handler", [Attr::new("error", e.to_string())]);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async move {
            match sigterm {
                Some(mut sigterm) => {
                    sigterm.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => logger.info("received Ctrl-C"),
            _ = terminate => logger.info("received SIGTERM"),
        }
    }
}
