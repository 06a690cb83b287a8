//! # Config Loader
//!
//! Locates JSON configuration files and deserializes them into any
//! `serde::de::DeserializeOwned` type.
//!
//! ```no_run
//! use config_loader::{find_config_file, load_json};
//!
//! #[derive(serde::Deserialize)]
//! struct AppConfig {
//!     port: u16,
//! }
//!
//! fn main() -> Result<(), config_loader::ConfigError> {
//!     let path = find_config_file("server_config.json")?;
//!     let config: AppConfig = load_json(&path)?;
//!     println!("port = {}", config.port);
//!     Ok(())
//! }
//! ```

pub mod error;

pub use error::{ConfigError, Result};

use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Reads a configuration file as text.
pub fn load_config_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Ok(fs::read_to_string(path)?)
}

/// Parses a JSON document held in memory (e.g. an environment variable).
pub fn from_json_str<T: DeserializeOwned>(content: &str) -> Result<T> {
    Ok(serde_json::from_str(content)?)
}

/// Reads and parses a JSON configuration file.
pub fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let content = load_config_file(path)?;
    from_json_str(&content)
}

/// Looks for a configuration file in the usual places.
///
/// Search order:
/// 1. `CONFIG_PATH` environment variable (if it points at an existing file)
/// 2. `./config/{filename}`
/// 3. `./{filename}`
pub fn find_config_file(filename: &str) -> Result<PathBuf> {
    if let Ok(path) = env::var("CONFIG_PATH") {
        let path_buf = PathBuf::from(&path);
        if path_buf.exists() {
            return Ok(path_buf);
        }
    }

    let candidates = [
        PathBuf::from("./config").join(filename),
        PathBuf::from("./").join(filename),
    ];
    if let Some(found) = candidates.into_iter().find(|p| p.exists()) {
        return Ok(found);
    }

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found. Searched: CONFIG_PATH env var, ./config/{}, ./{}",
        filename, filename, filename
    )))
}
