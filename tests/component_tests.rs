//! Component lifecycle tests
//!
//! These tests verify:
//! - Components log through a `component`-scoped logger
//! - SQLite state persists across component instances
//! - A failed start leaves the component stoppable
//! - Config files drive the whole start/stop sequence

use ops_toolkit::components::{self, PostgresComponent, PostgresConfig, SqliteComponent, SqliteConfig};
use ops_toolkit::config::load_from_file;
use ops_toolkit::prelude::*;
use std::fs;
use tempfile::TempDir;

fn json_logger() -> (Logger, CaptureBuffer) {
    let buffer = CaptureBuffer::new();
    let logger = Logger::builder()
        .format("json")
        .sink(Sink::new("memory", buffer.clone()))
        .build()
        .unwrap();
    (logger, buffer)
}

fn parsed_lines(buffer: &CaptureBuffer) -> Vec<serde_json::Value> {
    buffer
        .contents()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_sqlite_logs_with_component_attr() {
    let (logger, buffer) = json_logger();
    let mut sqlite = SqliteComponent::new(Some(SqliteConfig::new(":memory:")), Some(logger)).unwrap();

    sqlite.start().await.unwrap();
    sqlite.stop().await.unwrap();

    let lines = parsed_lines(&buffer);
    let messages: Vec<&str> = lines.iter().map(|l| l["msg"].as_str().unwrap()).collect();
    assert_eq!(
        messages,
        vec![
            "connecting to database",
            "successfully connected to database",
            "closing database connection",
        ]
    );
    assert!(lines.iter().all(|l| l["component"] == "sqlite"));
}

#[tokio::test]
async fn test_sqlite_data_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.db");
    let config = SqliteConfig::new(path.to_str().unwrap());

    let mut first = SqliteComponent::new(Some(config.clone()), Some(Logger::discard())).unwrap();
    first.start().await.unwrap();
    first
        .with_connection(|conn| {
            conn.execute_batch("CREATE TABLE jobs (id INTEGER PRIMARY KEY); INSERT INTO jobs VALUES (7);")
        })
        .unwrap()
        .unwrap();
    first.stop().await.unwrap();

    let mut second = SqliteComponent::new(Some(config), Some(Logger::discard())).unwrap();
    second.start().await.unwrap();
    let id: i64 = second
        .with_connection(|conn| conn.query_row("SELECT id FROM jobs", [], |row| row.get(0)))
        .unwrap()
        .unwrap();
    assert_eq!(id, 7);
    second.stop().await.unwrap();
}

#[tokio::test]
async fn test_postgres_refused_connection() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let mut config = PostgresConfig::new("app", "orders");
    config.host = "127.0.0.1".to_string();
    config.port = port;

    let (logger, buffer) = json_logger();
    let mut postgres = PostgresComponent::new(Some(config), Some(logger)).unwrap();

    let err = postgres.start().await.unwrap_err();
    assert!(matches!(err, ToolkitError::Connection { .. }));
    assert_eq!(postgres.state(), LifecycleState::Created);
    assert!(postgres.client().is_err());

    let lines = parsed_lines(&buffer);
    let last = lines.last().unwrap();
    assert_eq!(last["level"], "ERROR");
    assert_eq!(last["component"], "postgres");

    postgres.stop().await.unwrap();
    assert_eq!(postgres.state(), LifecycleState::Stopped);
}

#[tokio::test]
async fn test_config_file_drives_lifecycle() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("app.db");
    let log = dir.path().join("logs/app.log");
    let config_path = dir.path().join("config.yaml");

    fs::write(
        &config_path,
        format!(
            "logging:\n  level: 0\n  format: json\n  output: {}\nsqlite:\n  file_path: {}\n  foreign_keys: true\nhttp:\n  address: 127.0.0.1:0\n  shutdown_timeout: 2s\n",
            log.display(),
            db.display()
        ),
    )
    .unwrap();

    let config: AppConfig = load_from_file(&config_path).unwrap();
    let logger = Logger::from_config(&config.logging).unwrap();

    let built = components::from_config(&config, &logger).unwrap();
    let mut running = components::start_all(built, &logger).await.unwrap();
    assert_eq!(running.len(), 2);
    assert_eq!(components::stop_all(&mut running, &logger).await, 0);

    let content = fs::read_to_string(&log).unwrap();
    assert!(content.contains("\"component\":\"sqlite\""));
    assert!(content.contains("\"component\":\"http_server\""));
    assert!(content.contains("\"msg\":\"server stopped\""));
    assert!(db.exists());
}
