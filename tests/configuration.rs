//! Tests for configuration and mode selection

use std::{io::Write, path::PathBuf};

use homeplan::{
    Config,
    config::{API_KEY_PLACEHOLDER, CloudConfig, ObservabilityConfig, ServerConfig, StorageConfig},
};
use homeplan_planner::SyncMode;
use temp_dir::TempDir;

fn config(dir: &TempDir, api_key: &str, url: &str) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        },
        storage: StorageConfig {
            data_dir: dir.path().join("data"),
        },
        cloud: CloudConfig {
            api_key: api_key.to_string(),
            url: url.to_string(),
            poll_interval_ms: 10,
        },
        observability: ObservabilityConfig::default(),
    }
}

#[test]
fn test_config_loads_from_default_toml() {
    let config = Config::load(None).expect("Failed to load config");

    assert_eq!(config.server.port, 3000);
    assert_eq!(config.storage.data_dir, PathBuf::from("data"));
    assert_eq!(config.cloud.api_key, API_KEY_PLACEHOLDER);
    assert_eq!(config.sync_mode(), SyncMode::Local);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_file_selects_cloud() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("homeplan.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        r#"
[server]
host = "0.0.0.0"
port = 8080

[storage]
data_dir = "/var/lib/homeplan"

[cloud]
api_key = "AIzaSyExample"
url = "memory://"
"#
    )
    .unwrap();

    let config = Config::load(Some(path.display().to_string())).unwrap();

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.cloud.poll_interval_ms, 500);
    assert_eq!(config.sync_mode(), SyncMode::Cloud);
    assert!(config.validate().is_ok());
}

#[tokio::test]
async fn test_local_planner_is_enabled_at_startup() {
    let dir = TempDir::new().unwrap();
    let planner = homeplan::cli::server::planner(&config(&dir, "", ""))
        .await
        .unwrap();

    assert_eq!(planner.mode(), SyncMode::Local);
    assert!(planner.is_enabled().await);
}

#[tokio::test]
async fn test_cloud_planner_waits_for_login() {
    let dir = TempDir::new().unwrap();
    let planner = homeplan::cli::server::planner(&config(&dir, "key", "memory://"))
        .await
        .unwrap();

    assert_eq!(planner.mode(), SyncMode::Cloud);
    assert!(!planner.is_enabled().await);
}

#[tokio::test]
async fn test_api_key_mismatch_stops_startup() {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", dir.path().join("cloud.db").display());

    homeplan::cli::server::planner(&config(&dir, "key-1", &url))
        .await
        .unwrap();

    let err = match homeplan::cli::server::planner(&config(&dir, "key-2", &url)).await {
        Ok(_) => panic!("mismatched api key accepted"),
        Err(err) => err,
    };
    assert!(err.to_string().contains("invalid api key"));
}
