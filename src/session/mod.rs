//! Per-connection FTP session.
//!
//! A `Session` owns one control connection's protocol state and processes
//! its commands strictly sequentially on a single blocking worker. The
//! command handlers live in [`commands`].

mod commands;

use log::info;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::CredentialStore;
use crate::protocol::{Command, Reply, parse_command};
use crate::transfer::DataChannel;

/// Outcome of dispatching one command line.
pub(crate) enum LoopControl {
    Continue,
    Quit,
}

/// State for one control connection.
///
/// Created at accept, destroyed when the connection closes; never shared
/// across connections or workers.
pub struct Session {
    control: TcpStream,
    peer: SocketAddr,
    creds: Arc<dyn CredentialStore>,
    /// Set by a recognized USER; survives failed PASS attempts.
    username: Option<String>,
    authenticated: bool,
    /// Absolute virtual working directory; mutated only by successful CWD.
    cwd: PathBuf,
    /// Set by RNFR, consumed or discarded by the next RNTO.
    pending_rename: Option<PathBuf>,
    data: DataChannel,
}

impl Session {
    pub fn new(
        control: TcpStream,
        peer: SocketAddr,
        creds: Arc<dyn CredentialStore>,
        root: PathBuf,
        data_accept_timeout: Duration,
    ) -> Self {
        Self {
            control,
            peer,
            creds,
            username: None,
            authenticated: false,
            cwd: root,
            pending_rename: None,
            data: DataChannel::new(data_accept_timeout),
        }
    }

    /// Runs the session to completion: banner, then one command per
    /// iteration until QUIT or the control connection goes away.
    pub fn run(mut self) {
        if let Err(e) = self.serve() {
            // Control-connection I/O failure is fatal to this session only.
            info!("Session {} ended: {e}", self.peer);
        }
    }

    fn serve(&mut self) -> io::Result<()> {
        let mut reader = BufReader::new(self.control.try_clone()?);
        self.send(Reply::new(220, "rsftpd ready"))?;

        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                info!("Client {} closed the control connection", self.peer);
                return Ok(());
            }

            let command = parse_command(&line);
            match &command {
                Command::PASS(_) => info!("{} -> PASS ****", self.peer),
                other => info!("{} -> {other:?}", self.peer),
            }

            match self.dispatch(command)? {
                LoopControl::Continue => {}
                LoopControl::Quit => return Ok(()),
            }
        }
    }

    pub(crate) fn send(&mut self, reply: Reply) -> io::Result<()> {
        self.control.write_all(reply.to_wire().as_bytes())
    }

    pub(crate) fn send_raw(&mut self, text: &str) -> io::Result<()> {
        self.control.write_all(text.as_bytes())
    }
}
