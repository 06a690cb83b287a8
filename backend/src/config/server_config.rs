use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Relay listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub max_connections: usize,
    pub enable_tls: bool,
    pub pkcs12_path: Option<String>,
    pub pkcs12_password: Option<String>,
    /// Poll interval of each connection's read loop
    pub read_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            max_connections: 100,
            enable_tls: false,
            pkcs12_path: None,
            pkcs12_password: None,
            read_timeout_ms: 100,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms.max(1))
    }
}
