//! rsftpd - Entry Point
//!
//! An FTP server implementing the core command set of RFC 959.

use log::{error, info, warn};
use std::process;
use std::sync::Arc;

use rsftpd::Server;
use rsftpd::auth::MemoryCredentials;
use rsftpd::config::ServerConfig;

#[tokio::main]
async fn main() {
    // env_logger picks up the RUST_LOG environment variable
    env_logger::init();

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            process::exit(1);
        }
    };

    let creds = match MemoryCredentials::load(&config.users_file) {
        Ok(creds) => Arc::new(creds),
        Err(e) => {
            warn!(
                "Could not read {}: {e}; no users will be able to log in",
                config.users_file.display()
            );
            Arc::new(MemoryCredentials::default())
        }
    };

    info!("Launching rsftpd on {}", config.control_socket());

    let server = match Server::bind(config, creds).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to bind control listener: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        error!("Server terminated: {e}");
        process::exit(1);
    }
}
