//! Application configuration
//!
//! Limit constants used by validation, plus the JSON configuration file
//! that tells the binary where the database lives and how long auth
//! tokens stay valid.

use crate::error::{AppError, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

// ===== Validation Limits =====

/// Maximum length of an entity, quest or task name
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum length of a username
pub const MAX_USERNAME_LENGTH: usize = 64;

/// Maximum length of a record body in bytes
pub const MAX_RECORD_TEXT_LENGTH: usize = 64 * 1024;

/// Longest auth token lifetime a config may ask for (ten years)
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

/// Number of random bytes in an auth token (hex encoded on the wire)
pub const AUTH_TOKEN_BYTES: usize = 16;

// ===== Config File Location =====

/// Environment variable naming the directory holding the config file
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
/// Environment variable naming the config file (without extension)
pub const CONFIG_NAME_ENV: &str = "CONFIG_NAME";

const DEFAULT_CONFIG_DIR: &str = "./opt";
const DEFAULT_CONFIG_NAME: &str = "config";

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/journal.sqlite")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Auth token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of an issued auth token in hours
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

fn default_token_ttl_hours() -> i64 {
    24 * 30
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

impl AuthConfig {
    /// Token lifetime, between one hour and [`MAX_TOKEN_TTL_HOURS`]
    pub fn token_ttl(&self) -> Result<Duration> {
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.token_ttl_hours) {
            return Err(AppError::Config(format!(
                "auth.token_ttl_hours must be between 1 and {}",
                MAX_TOKEN_TTL_HOURS
            )));
        }
        Duration::try_hours(self.token_ttl_hours).ok_or_else(|| {
            AppError::Config(format!(
                "auth.token_ttl_hours {} is out of range",
                self.token_ttl_hours
            ))
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is not set
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "campaign_journal=debug,info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Resolve the config file path from CONFIG_PATH / CONFIG_NAME
    pub fn default_location() -> PathBuf {
        let dir = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
        let name =
            std::env::var(CONFIG_NAME_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_NAME.to_string());
        Path::new(&dir).join(format!("{}.json", name))
    }

    /// Load configuration from disk, writing the defaults if the file is missing
    pub async fn load(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            tracing::info!("Config file {:?} not found, writing defaults", path);
            let default = AppConfig::default();
            default.save(path).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(path).await?;
        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse {:?}: {}", path, e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to disk
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.database.max_connections == 0 {
            return Err(AppError::Config(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        self.auth.token_ttl()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_defaults_written_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("opt").join("config.json");

        let config = AppConfig::load(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.auth.token_ttl_hours, 720);
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{"database":{"path":"game.db"}}"#)
            .await
            .unwrap();

        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config.database.path, PathBuf::from("game.db"));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.logging.filter, "campaign_journal=debug,info");
    }

    #[tokio::test]
    async fn test_invalid_values_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{"auth":{"token_ttl_hours":0}}"#)
            .await
            .unwrap();

        let result = AppConfig::load(&path).await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_huge_token_ttl_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, format!(r#"{{"auth":{{"token_ttl_hours":{}}}}}"#, i64::MAX))
            .await
            .unwrap();

        let result = AppConfig::load(&path).await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_token_ttl_bounds() {
        let ttl = |hours| AuthConfig { token_ttl_hours: hours }.token_ttl();
        assert_eq!(ttl(1).unwrap(), Duration::hours(1));
        assert!(ttl(MAX_TOKEN_TTL_HOURS).is_ok());
        assert!(ttl(MAX_TOKEN_TTL_HOURS + 1).is_err());
        assert!(ttl(-5).is_err());
    }
}
