use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use homeplan_planner::SyncMode;
use serde::Deserialize;
use std::{env, path::PathBuf, time::Duration};

/// Cloud credential value shipped in sample configs, treated as "not set".
pub const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub cloud: CloudConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory of the on-device key/value storage.
    pub data_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CloudConfig {
    #[serde(default)]
    pub api_key: String,
    /// `memory://` or a `sqlite:` url.
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            url: String::new(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl CloudConfig {
    /// Local mode unless a real api key is configured.
    pub fn sync_mode(&self) -> SyncMode {
        let api_key = self.api_key.trim();

        if api_key.is_empty() || api_key == API_KEY_PLACEHOLDER {
            SyncMode::Local
        } else {
            SyncMode::Cloud
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_poll_interval_ms() -> u64 {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment variables
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (HOMEPLAN__CLOUD__API_KEY, etc.)
    /// 2. Config file specified by path
    /// 3. Hardcoded defaults
    pub fn load(config_path: Option<String>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        builder = builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("storage.data_dir", "data")?
            .set_default("cloud.api_key", "")?
            .set_default("cloud.url", "")?
            .set_default("cloud.poll_interval_ms", default_poll_interval_ms())?
            .set_default("observability.log_level", default_log_level())?;

        let config_file_path = config_path
            .or_else(|| env::var("CONFIG_PATH").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        // Optional, missing files are ignored
        if std::path::Path::new(&config_file_path).exists() {
            builder = builder.add_source(File::with_name(&config_file_path));
        }

        builder = builder.add_source(
            Environment::with_prefix("HOMEPLAN")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.cloud.sync_mode()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err("Storage data_dir must not be empty".to_string());
        }
        if self.sync_mode() == SyncMode::Cloud {
            if self.cloud.url.trim().is_empty() {
                return Err("Cloud url is required when an api key is set".to_string());
            }
            if self.cloud.poll_interval_ms == 0 {
                return Err("Cloud poll_interval_ms must be at least 1".to_string());
            }
        }
        Ok(())
    }
}
