//! Server configuration

pub mod logging_config;
pub mod server_app_config;
pub mod server_config;

pub use logging_config::LoggingConfig;
pub use server_app_config::ServerAppConfig;
pub use server_config::ServerConfig;
