//! TOML file configuration structures.
//!
//! These structs directly map to the `tickethub-config.toml` file format.
//! Every section and key is optional.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub queue: QueueConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Queue configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Name of the queue ticket purchases are sent to.
    #[serde(default = "default_queue_name")]
    pub name: String,
    /// Deadline for each broker call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Storage connection string. The `AZURE_STORAGE_CONNECTION_STRING`
    /// environment variable takes precedence over this value.
    #[serde(default)]
    pub connection_string: Option<String>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: default_queue_name(),
            timeout_secs: default_timeout_secs(),
            connection_string: None,
        }
    }
}

fn default_queue_name() -> String {
    "tickethub".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}
