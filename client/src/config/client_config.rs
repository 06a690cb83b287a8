//! Client configuration loaded from JSON.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::media::MediaConstraints;
use crate::peer::PeerConfig;

const CONFIG_FILE_NAME: &str = "client_config.json";

/// Relay endpoint settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Relay address (host:port)
    pub address: String,
    pub enable_tls: bool,
    /// Name checked against the certificate; defaults to the host part of `address`
    pub tls_domain: Option<String>,
    /// Accept self-signed relay certificates (development only)
    pub accept_invalid_certs: bool,
    /// How long the reader thread blocks before yielding the stream to writers
    pub poll_interval_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            address: "127.0.0.1:8080".to_string(),
            enable_tls: false,
            tls_domain: None,
            accept_invalid_certs: false,
            poll_interval_ms: 50,
        }
    }
}

impl RelayConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn domain(&self) -> &str {
        match &self.tls_domain {
            Some(domain) => domain,
            None => self
                .address
                .rsplit_once(':')
                .map(|(host, _)| host)
                .unwrap_or(&self.address),
        }
    }
}

/// One STUN/TURN entry handed to the peer connection engine as-is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServer {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServer {
    pub fn stun(url: impl Into<String>) -> Self {
        IceServer {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_file_path: String,
    pub log_level: String,
    pub enable_console: bool,
    pub enable_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_file_path: "strangerlink-client.log".to_string(),
            log_level: "info".to_string(),
            enable_console: true,
            enable_file: false,
        }
    }
}

impl LoggingConfig {
    pub fn to_log_options(&self) -> logging::LogOptions {
        logging::LogOptions {
            level: self.log_level.parse().unwrap_or(logging::LogLevel::Info),
            log_file: self
                .enable_file
                .then(|| self.log_file_path.clone().into()),
            console: self.enable_console,
            env_override: true,
        }
    }
}

/// Client configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub relay: RelayConfig,
    pub ice_servers: Vec<IceServer>,
    pub media: MediaConstraints,
    /// Re-enter the queue automatically when the partner goes away
    pub auto_requeue: bool,
    pub logging: LoggingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            relay: RelayConfig::default(),
            ice_servers: vec![IceServer::stun("stun:stun.l.google.com:19302")],
            media: MediaConstraints::default(),
            auto_requeue: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> config_loader::Result<Self> {
        config_loader::load_json(path)
    }

    pub fn from_json(json: &str) -> config_loader::Result<Self> {
        config_loader::from_json_str(json)
    }

    /// Looks for `client_config.json` in the usual places, falling back to defaults
    pub fn load() -> Self {
        let found = config_loader::find_config_file(CONFIG_FILE_NAME)
            .and_then(|path| Self::load_from_file(&path).map(|cfg| (path, cfg)));

        match found {
            Ok((path, cfg)) => {
                info!(path = %path.display(), "Loaded client configuration");
                cfg
            }
            Err(e) => {
                info!(reason = %e, "No usable client configuration, using defaults");
                Self::default()
            }
        }
    }

    pub fn peer_config(&self) -> PeerConfig {
        PeerConfig {
            ice_servers: self.ice_servers.clone(),
        }
    }
}
