//! Configuration module for tickethub-server.
//!
//! Handles loading configuration from an optional TOML file, CLI arguments,
//! and environment variables. The queue connection string is a secret and is
//! normally supplied through the environment.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{QueueConfig, ServerConfig};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tickethub_core::queue::validate_queue_name;

/// Environment variable holding the storage connection string.
pub const CONNECTION_STRING_ENV: &str = "AZURE_STORAGE_CONNECTION_STRING";

/// Errors that can occur during configuration loading.
///
/// All of them are fatal: the server does not start without a complete
/// queue configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("queue connection string is missing (set AZURE_STORAGE_CONNECTION_STRING)")]
    MissingConnectionString,
}

/// Loaded configuration result containing all parts.
#[derive(Debug)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub queue: QueueConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: Option<&Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.map(Path::to_path_buf),
            listen_override,
        }
    }

    /// Load and process the configuration, reading the connection string
    /// from the environment.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        self.load_with_connection_string(std::env::var(CONNECTION_STRING_ENV).ok())
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file, if one was given
    /// 2. Apply CLI overrides
    /// 3. Resolve the connection string (`env_connection_string` wins over the file)
    /// 4. Validate the configuration
    pub fn load_with_connection_string(
        &self,
        env_connection_string: Option<String>,
    ) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = match &self.config_path {
            Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
            None => FileConfig::default(),
        };

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        let connection_string = env_connection_string
            .into_iter()
            .chain(file_config.queue.connection_string.take())
            .find(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingConnectionString)?;

        self.validate(&file_config)?;

        Ok(LoadedConfig {
            server: ServerConfig {
                listen: file_config.server.listen,
            },
            queue: QueueConfig::new(
                file_config.queue.name,
                Duration::from_secs(file_config.queue.timeout_secs),
                connection_string,
            ),
        })
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        validate_queue_name(&config.queue.name)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        if config.queue.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "queue.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "tickethub-{name}-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_missing_connection_string_is_fatal() {
        let loader = ConfigLoader::new(None, None);
        assert!(matches!(
            loader.load_with_connection_string(None),
            Err(ConfigError::MissingConnectionString)
        ));
        assert!(matches!(
            loader.load_with_connection_string(Some("   ".to_string())),
            Err(ConfigError::MissingConnectionString)
        ));
    }

    #[test]
    fn test_environment_wins_over_file() {
        let path = write_config(
            "env-wins",
            "[queue]\nconnection_string = \"AccountName=file;AccountKey=a2V5\"\n",
        );
        let loader = ConfigLoader::new(Some(&path), None);

        let loaded = loader
            .load_with_connection_string(Some("UseDevelopmentStorage=true".to_string()))
            .unwrap();
        assert_eq!(loaded.queue.connection_string(), "UseDevelopmentStorage=true");

        let loaded = loader.load_with_connection_string(None).unwrap();
        assert_eq!(
            loaded.queue.connection_string(),
            "AccountName=file;AccountKey=a2V5"
        );
        assert!(!format!("{loaded:?}").contains("a2V5"));

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_defaults_and_listen_override() {
        let listen: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let loader = ConfigLoader::new(None, Some(listen));
        let loaded = loader
            .load_with_connection_string(Some("UseDevelopmentStorage=true".to_string()))
            .unwrap();
        assert_eq!(loaded.server.listen, listen);
        assert_eq!(loaded.queue.name, "tickethub");
        assert_eq!(loaded.queue.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let path = write_config("bad-name", "[queue]\nname = \"Ticket_Hub\"\n");
        let loader = ConfigLoader::new(Some(&path), None);
        assert!(matches!(
            loader.load_with_connection_string(Some("UseDevelopmentStorage=true".to_string())),
            Err(ConfigError::ValidationError(_))
        ));
        std::fs::remove_file(path).unwrap();

        let path = write_config("zero-timeout", "[queue]\ntimeout_secs = 0\n");
        let loader = ConfigLoader::new(Some(&path), None);
        assert!(matches!(
            loader.load_with_connection_string(Some("UseDevelopmentStorage=true".to_string())),
            Err(ConfigError::ValidationError(_))
        ));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let loader = ConfigLoader::new(Some(Path::new("/nonexistent/tickethub.toml")), None);
        assert!(matches!(
            loader.load_with_connection_string(Some("UseDevelopmentStorage=true".to_string())),
            Err(ConfigError::IoError(_))
        ));
    }
}
