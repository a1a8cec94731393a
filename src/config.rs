use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::listings::FETCH_LIMIT;
use crate::pagination::DEFAULT_PAGE_SIZE;

/// Environment variable that takes precedence over the configured API key.
pub const API_KEY_ENV: &str = "AUCTION_API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Reading config {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Parsing config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub api_key: String,
    pub listen: String,
    pub credentials_path: PathBuf,
    pub fetch_limit: usize,
    pub page_size: usize,
    pub bid_refresh_delay_ms: u64,
    pub create_refresh_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://v2.api.noroff.dev".to_string(),
            api_key: String::new(),
            listen: "127.0.0.1:8080".to_string(),
            credentials_path: PathBuf::from("credentials.json"),
            fetch_limit: FETCH_LIMIT,
            page_size: DEFAULT_PAGE_SIZE,
            bid_refresh_delay_ms: 1500,
            create_refresh_delay_ms: 1200,
        }
    }
}

impl Config {
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = match tokio::fs::read_to_string(path).await {
            Ok(raw) => Self::from_yaml(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(?path, "Config file not found, using defaults");
                Self::default()
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.api_key = key;
        }

        Ok(config)
    }

    pub fn bid_refresh_delay(&self) -> Duration {
        Duration::from_millis(self.bid_refresh_delay_ms)
    }

    pub fn create_refresh_delay(&self) -> Duration {
        Duration::from_millis(self.create_refresh_delay_ms)
    }
}
