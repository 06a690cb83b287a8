use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{LoggingConfig, ServerConfig};

/// Relay server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerAppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl ServerAppConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: impl AsRef<Path>) -> config_loader::Result<Self> {
        config_loader::load_json(path)
    }

    /// Parse configuration held in a string (the `CONFIG` environment variable)
    pub fn from_json(json: &str) -> config_loader::Result<Self> {
        config_loader::from_json_str(json)
    }
}
