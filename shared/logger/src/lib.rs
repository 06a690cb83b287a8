//! Logging setup shared by the relay server and its clients.
//!
//! Components log through the `tracing` macros; this crate only decides where
//! the events go (console, append-only file, or both) and at which level.

pub mod error;
mod log_level;
mod subscriber;
mod timestamp;

pub use error::{LoggingError, Result};
pub use log_level::LogLevel;
pub use subscriber::{LogOptions, build_subscriber, init};
