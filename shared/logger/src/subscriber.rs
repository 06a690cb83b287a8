//! Subscriber construction.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;

use crate::error::Result;
use crate::log_level::LogLevel;
use crate::timestamp::LocalTimestamp;

/// Where log events go and which ones are kept.
#[derive(Debug, Clone)]
pub struct LogOptions {
    pub level: LogLevel,
    /// Append-mode log file; created if missing.
    pub log_file: Option<PathBuf>,
    pub console: bool,
    /// Let `RUST_LOG` replace `level` when it is set.
    pub env_override: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        LogOptions {
            level: LogLevel::Info,
            log_file: None,
            console: true,
            env_override: true,
        }
    }
}

/// Builds a subscriber without installing it.
///
/// # Errors
///
/// Returns error if the log file cannot be created or opened.
pub fn build_subscriber(options: &LogOptions) -> Result<impl Subscriber + Send + Sync + 'static> {
    let filter = if options.env_override {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(options.level.as_directive()))
    } else {
        EnvFilter::new(options.level.as_directive())
    };

    let console_layer = options
        .console
        .then(|| fmt::layer().with_timer(LocalTimestamp).with_target(true));

    let file_layer = match &options.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_timer(LocalTimestamp)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    Ok(tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer))
}

/// Installs the global subscriber. Call once at process start.
///
/// # Examples
///
/// ```no_run
/// use logging::{LogLevel, LogOptions};
///
/// logging::init(&LogOptions {
///     level: LogLevel::Debug,
///     log_file: Some("relay.log".into()),
///     ..LogOptions::default()
/// })
/// .unwrap();
/// tracing::info!("relay starting");
/// ```
pub fn init(options: &LogOptions) -> Result<()> {
    tracing::subscriber::set_global_default(build_subscriber(options)?)?;
    Ok(())
}
