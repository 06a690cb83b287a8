use thiserror::Error;

/// Result type used across the crate
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while locating or parsing configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
