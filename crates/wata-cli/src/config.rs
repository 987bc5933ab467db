//! CLI configuration
//!
//! Everything is read from the environment (after `.env` has been loaded);
//! command-line flags override individual values in `main`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use wata_auth::AuthConfig;
use wata_db::DatabaseConfig;

/// Where accounts and balances live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL (plus Redis when `REDIS_URL` is set)
    #[default]
    Postgres,
    /// In-process store; state is discarded on exit
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage backend {:?}", other)),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format {:?}", other)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
    /// Root directory for the error log; `None` disables it
    pub path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            path: None,
        }
    }
}

/// Complete CLI configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    pub storage: StorageBackend,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let mut logging = LoggingConfig::default();
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            logging.format = format.parse().map_err(anyhow::Error::msg)?;
        }
        logging.path = std::env::var("LOG_PATH")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        let storage = match std::env::var("WATA_STORAGE") {
            Ok(value) => value.parse().map_err(anyhow::Error::msg)?,
            Err(_) => StorageBackend::default(),
        };

        Ok(Self {
            database: DatabaseConfig::from_env(),
            auth: AuthConfig::from_env().map_err(anyhow::Error::msg)?,
            logging,
            storage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_storage_backend() {
        assert_eq!("Memory".parse::<StorageBackend>(), Ok(StorageBackend::Memory));
        assert_eq!("postgresql".parse::<StorageBackend>(), Ok(StorageBackend::Postgres));
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_parse_log_format() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("text".parse::<LogFormat>(), Ok(LogFormat::Pretty));
    }
}
