//! Server configuration.
//!
//! Loaded once at startup from an optional `config.toml`, with
//! `RSFTPD_`-prefixed environment variables layered on top. Every field has
//! a built-in default so the server also runs with no config file at all.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the control listener binds to.
    pub bind_address: String,

    /// Control connection port. The well-known port 21 needs privileges;
    /// set a high port for unprivileged runs.
    pub control_port: u16,

    /// Size of the session worker pool. Connections beyond this queue in
    /// the listen backlog until a worker frees up.
    pub max_workers: usize,

    /// Seconds a passive-mode data listener waits for the client to connect.
    pub data_accept_timeout_secs: u64,

    /// Initial working directory for new sessions. Defaults to the server
    /// process working directory when unset.
    pub server_root: Option<PathBuf>,

    /// Credential file, one `name=password` entry per line.
    pub users_file: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            control_port: 21,
            max_workers: 10,
            data_accept_timeout_secs: 10,
            server_root: None,
            users_file: PathBuf::from("users.conf"),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `config.toml` (if present) and the
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("RSFTPD"))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::Message(
                "max_workers must be greater than 0".into(),
            ));
        }
        if self.data_accept_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "data_accept_timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Bind address and control port as a socket address string.
    pub fn control_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.control_port)
    }

    /// Timeout applied to passive-mode data connection accepts.
    pub fn data_accept_timeout(&self) -> Duration {
        Duration::from_secs(self.data_accept_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ServerConfig::default();
        assert_eq!(config.control_port, 21);
        assert_eq!(config.max_workers, 10);
        assert_eq!(config.data_accept_timeout(), Duration::from_secs(10));
        assert!(config.server_root.is_none());
    }

    #[test]
    fn control_socket_joins_address_and_port() {
        let config = ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            control_port: 2121,
            ..ServerConfig::default()
        };
        assert_eq!(config.control_socket(), "127.0.0.1:2121");
    }

    #[test]
    fn zero_workers_rejected() {
        let config = ServerConfig {
            max_workers: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
