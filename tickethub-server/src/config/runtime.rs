//! Validated runtime configuration.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Server settings after CLI overrides.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

/// Queue settings, ready to build the gateway from.
#[derive(Clone)]
pub struct QueueConfig {
    pub name: String,
    pub timeout: Duration,
    connection_string: String,
}

impl QueueConfig {
    pub fn new(name: String, timeout: Duration, connection_string: String) -> Self {
        Self {
            name,
            timeout,
            connection_string,
        }
    }

    /// The raw connection string. Never log this.
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }
}

impl fmt::Debug for QueueConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueConfig")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("connection_string", &"<redacted>")
            .finish()
    }
}
