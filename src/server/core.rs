//! Accept loop and session worker pool.

use log::{info, warn};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::task;

use crate::auth::CredentialStore;
use crate::config::ServerConfig;
use crate::session::Session;

/// Accepts control connections and runs each session to completion on a
/// blocking worker.
///
/// The semaphore bounds the worker pool: the accept loop does not take a
/// new connection while every worker is busy, so excess clients queue in
/// the listen backlog until one frees up.
pub struct Server {
    listener: TcpListener,
    creds: Arc<dyn CredentialStore>,
    config: Arc<ServerConfig>,
    workers: Arc<Semaphore>,
}

impl Server {
    pub async fn bind(config: ServerConfig, creds: Arc<dyn CredentialStore>) -> io::Result<Self> {
        let listener = TcpListener::bind(config.control_socket()).await?;
        info!("Control listener bound to {}", listener.local_addr()?);
        let workers = Arc::new(Semaphore::new(config.max_workers));
        Ok(Self {
            listener,
            creds,
            config: Arc::new(config),
            workers,
        })
    }

    /// The actual bound address; useful when the configured port is 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(&self) -> io::Result<()> {
        let root = self.session_root()?;
        info!(
            "Serving {} with {} session workers",
            root.display(),
            self.config.max_workers
        );

        loop {
            let permit = match Arc::clone(&self.workers).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return Ok(()), // semaphore closed, shutting down
            };
            let (stream, peer) = self.listener.accept().await?;
            info!("Accepted control connection from {peer}");

            let creds = Arc::clone(&self.creds);
            let config = Arc::clone(&self.config);
            let root = root.clone();
            task::spawn_blocking(move || {
                let _permit = permit;
                let control = stream.into_std().and_then(|s| {
                    s.set_nonblocking(false)?;
                    Ok(s)
                });
                match control {
                    Ok(control) => {
                        Session::new(control, peer, creds, root, config.data_accept_timeout())
                            .run();
                    }
                    Err(e) => warn!("Failed to adopt control socket for {peer}: {e}"),
                }
            });
        }
    }

    /// Initial working directory handed to every session: the configured
    /// root, or the server process working directory.
    fn session_root(&self) -> io::Result<PathBuf> {
        match &self.config.server_root {
            Some(root) => Ok(root.clone()),
            None => std::env::current_dir(),
        }
    }
}
