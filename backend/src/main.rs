use std::process::ExitCode;

use strangerlink_server::config::ServerAppConfig;
use strangerlink_server::{Storage, TcpServer};
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let (config, notes) = load_config();

    if let Err(e) = logging::init(&config.logging.to_log_options()) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }
    for note in notes {
        info!("{}", note);
    }

    info!("StrangerLink relay starting...");
    run_tcp_server(&config)
}

/// Resolves configuration, returning it with notes to log once logging is up.
///
/// Order: `CONFIG` env holding a JSON document, first CLI argument,
/// `server_config.json`, built-in defaults.
fn load_config() -> (ServerAppConfig, Vec<String>) {
    let mut notes = Vec::new();

    if let Ok(json_str) = std::env::var("CONFIG") {
        match ServerAppConfig::from_json(&json_str) {
            Ok(cfg) => {
                notes.push("Configuration loaded from CONFIG env as JSON string".to_string());
                return (cfg, notes);
            }
            Err(e) => notes.push(format!("CONFIG env is not valid JSON: {}", e)),
        }
    }

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "server_config.json".to_string());

    match ServerAppConfig::load_from_file(&config_path) {
        Ok(cfg) => {
            notes.push(format!("Configuration loaded from: {}", config_path));
            (cfg, notes)
        }
        Err(e) => {
            notes.push(format!(
                "Failed to load configuration from {}: {}; using defaults",
                config_path, e
            ));
            (ServerAppConfig::default(), notes)
        }
    }
}

/// Runs the TCP server (blocking)
fn run_tcp_server(config: &ServerAppConfig) -> ExitCode {
    let bind_addr = config.server.bind_addr();

    let tcp_server = TcpServer::new(Storage::new())
        .with_max_connections(config.server.max_connections)
        .with_read_timeout(config.server.read_timeout());

    let tcp_server = if config.server.enable_tls {
        let Some(pkcs12_path) = &config.server.pkcs12_path else {
            error!("TLS enabled but pkcs12_path not set in config; refusing to start");
            return ExitCode::FAILURE;
        };
        let password = config.server.pkcs12_password.as_deref().unwrap_or("");

        match tcp_server.with_tls(pkcs12_path, password) {
            Ok(server) => server,
            Err(e) => {
                error!(error = %e, "Failed to enable TLS; server will NOT start");
                return ExitCode::FAILURE;
            }
        }
    } else {
        warn!("TLS is DISABLED - connections will not be encrypted");
        tcp_server
    };

    if let Err(e) = tcp_server.start(&bind_addr) {
        error!(addr = %bind_addr, error = %e, "TCP server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
