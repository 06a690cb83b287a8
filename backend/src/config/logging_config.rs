use serde::{Deserialize, Serialize};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
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
            log_file_path: "strangerlink-server.log".to_string(),
            log_level: "info".to_string(),
            enable_console: true,
            enable_file: true,
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
