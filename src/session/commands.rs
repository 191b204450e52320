//! Command handlers.
//!
//! Each handler validates session state and filesystem preconditions, then
//! emits exactly one terminal reply; the transfer commands (LIST, RETR,
//! STOR) additionally send a 150 preliminary reply before opening the data
//! connection. Failures reply and return - nothing here tears down the
//! control session except QUIT and control-socket write errors.

use log::{error, info};
use std::fs;
use std::io;
use std::net::IpAddr;

use super::{LoopControl, Session};
use crate::error::DataChannelError;
use crate::protocol::{Command, Reply};
use crate::storage;
use crate::transfer::{self, EprtError, parse_eprt_argument, parse_port_argument};

impl Session {
    pub(crate) fn dispatch(&mut self, command: Command) -> io::Result<LoopControl> {
        if command.requires_auth() && !self.authenticated {
            self.send(Reply::not_logged_in())?;
            return Ok(LoopControl::Continue);
        }

        let reply = match command {
            Command::USER(name) => self.cmd_user(&name),
            Command::PASS(password) => self.cmd_pass(&password),
            Command::QUIT => {
                self.send(Reply::new(221, "Goodbye"))?;
                return Ok(LoopControl::Quit);
            }
            Command::SYST => Reply::new(215, "UNIX Type: L8"),
            Command::FEAT => {
                // Zero extensions, framed by its own preliminary/terminal pair.
                self.send_raw("211-Features:\r\n211 End\r\n")?;
                return Ok(LoopControl::Continue);
            }
            Command::OPTS(arg) => self.cmd_opts(&arg),
            Command::PWD => Reply::new(257, format!("\"{}\"", self.cwd.display())),
            Command::CWD(arg) => self.cmd_cwd(&arg),
            Command::TYPE(arg) => self.cmd_type(&arg),
            Command::PORT(arg) => self.cmd_port(&arg),
            Command::EPRT(arg) => self.cmd_eprt(&arg),
            Command::PASV => self.cmd_pasv(),
            Command::LIST => return self.cmd_list(),
            Command::RETR(arg) => return self.cmd_retr(&arg),
            Command::STOR(arg) => return self.cmd_stor(&arg),
            Command::DELE(arg) => self.cmd_dele(&arg),
            Command::MKD(arg) => self.cmd_mkd(&arg),
            Command::RMD(arg) => self.cmd_rmd(&arg),
            Command::RNFR(arg) => self.cmd_rnfr(&arg),
            Command::RNTO(arg) => self.cmd_rnto(&arg),
            Command::SIZE(arg) => self.cmd_size(&arg),
            Command::UNKNOWN(verb) => {
                Reply::new(502, format!("Command not implemented: {verb}"))
            }
        };
        self.send(reply)?;
        Ok(LoopControl::Continue)
    }

    fn cmd_user(&mut self, name: &str) -> Reply {
        if self.creds.username_exists(name) {
            self.username = Some(name.to_string());
            Reply::new(331, "Password required")
        } else {
            Reply::new(530, "Invalid username")
        }
    }

    /// Credentials are checked only while not yet authenticated; a repeated
    /// PASS after login is rejected outright.
    fn cmd_pass(&mut self, password: &str) -> Reply {
        if self.authenticated {
            return Reply::new(530, "Already logged in");
        }
        match &self.username {
            Some(username) if self.creds.verify(username, password) => {
                self.authenticated = true;
                info!("{} logged in as {username}", self.peer);
                Reply::new(230, "Login successful")
            }
            Some(_) => {
                self.authenticated = false;
                Reply::new(530, "Invalid password")
            }
            None => Reply::new(530, "Please enter the username first"),
        }
    }

    fn cmd_opts(&self, arg: &str) -> Reply {
        if arg.eq_ignore_ascii_case("UTF8 ON") {
            Reply::new(200, "UTF8 mode enabled")
        } else {
            Reply::new(501, "Unsupported OPTS value")
        }
    }

    /// TYPE is accepted but inert: content is never translated.
    fn cmd_type(&self, arg: &str) -> Reply {
        if arg.eq_ignore_ascii_case("A") || arg.eq_ignore_ascii_case("I") {
            Reply::new(200, format!("Type set to {}", arg.to_ascii_uppercase()))
        } else {
            Reply::new(504, "Command not implemented for that parameter")
        }
    }

    fn cmd_cwd(&mut self, arg: &str) -> Reply {
        if arg.is_empty() {
            return Reply::new(501, "Missing directory argument");
        }
        let target = storage::resolve(&self.cwd, arg);
        if target.is_dir() {
            info!("{} changed directory to {}", self.peer, target.display());
            self.cwd = target;
            Reply::new(250, "Directory changed")
        } else {
            Reply::new(550, format!("{arg}: No such directory"))
        }
    }

    fn cmd_port(&mut self, arg: &str) -> Reply {
        match parse_port_argument(arg) {
            Some(target) => {
                self.data.set_active_target(target);
                Reply::new(200, "PORT command successful")
            }
            None => Reply::new(501, "Malformed PORT argument"),
        }
    }

    fn cmd_eprt(&mut self, arg: &str) -> Reply {
        match parse_eprt_argument(arg) {
            Ok(target) => {
                self.data.set_active_target(target);
                Reply::new(200, "EPRT command successful")
            }
            Err(EprtError::UnsupportedProtocol) => {
                Reply::new(522, "Network protocol not supported, use (1,2)")
            }
            Err(EprtError::Malformed) => Reply::new(501, "Malformed EPRT argument"),
        }
    }

    fn cmd_pasv(&mut self) -> Reply {
        let local_ip = match self.control.local_addr() {
            Ok(addr) => addr.ip(),
            Err(e) => {
                error!("Cannot determine control socket address for {}: {e}", self.peer);
                return Reply::new(421, "Cannot determine local address");
            }
        };
        let IpAddr::V4(ip) = local_ip else {
            return Reply::new(421, "Passive mode requires IPv4");
        };
        match self.data.reserve_passive_port() {
            Ok(port) => {
                let [h1, h2, h3, h4] = ip.octets();
                info!("{} entering passive mode on port {port}", self.peer);
                Reply::new(
                    227,
                    format!(
                        "Entering Passive Mode ({h1},{h2},{h3},{h4},{},{})",
                        port / 256,
                        port % 256
                    ),
                )
            }
            Err(e) => {
                error!("Failed to allocate passive port for {}: {e}", self.peer);
                Reply::new(421, "Failed to allocate passive port")
            }
        }
    }

    fn cmd_list(&mut self) -> io::Result<LoopControl> {
        self.send(Reply::new(150, "Opening data connection for directory listing"))?;
        let stream = match self.data.open() {
            Ok(stream) => stream,
            Err(e) => return self.abort_transfer(e),
        };
        let dir = self.cwd.clone();
        match transfer::send_listing(stream, &dir) {
            Ok(entries) => {
                info!("{} listed {} ({entries} entries)", self.peer, dir.display());
                self.send(Reply::new(226, "Directory send OK"))?;
            }
            Err(e) => {
                error!("Listing transfer failed for {}: {e}", self.peer);
                self.send(Reply::new(426, "Connection closed; transfer aborted"))?;
            }
        }
        Ok(LoopControl::Continue)
    }

    fn cmd_retr(&mut self, arg: &str) -> io::Result<LoopControl> {
        if arg.is_empty() {
            self.send(Reply::new(501, "Missing file name"))?;
            return Ok(LoopControl::Continue);
        }
        let path = storage::resolve(&self.cwd, arg);
        let size = match fs::metadata(&path) {
            Ok(metadata) if !metadata.is_dir() => metadata.len(),
            _ => {
                self.send(Reply::new(550, format!("{arg}: File not found")))?;
                return Ok(LoopControl::Continue);
            }
        };

        self.send(Reply::new(150, format!("Opening data connection ({size} bytes)")))?;
        let stream = match self.data.open() {
            Ok(stream) => stream,
            Err(e) => return self.abort_transfer(e),
        };
        match transfer::send_file(stream, &path) {
            Ok(sent) => {
                info!("{} retrieved {} ({sent} bytes)", self.peer, path.display());
                self.send(Reply::new(226, "Transfer complete"))?;
            }
            Err(e) => {
                error!("Download failed for {}: {e}", self.peer);
                self.send(Reply::new(426, "Connection closed; transfer aborted"))?;
            }
        }
        Ok(LoopControl::Continue)
    }

    fn cmd_stor(&mut self, arg: &str) -> io::Result<LoopControl> {
        if arg.is_empty() {
            self.send(Reply::new(501, "Missing file name"))?;
            return Ok(LoopControl::Continue);
        }
        let path = storage::resolve(&self.cwd, arg);
        if path.is_dir() || !storage::parent_accepts_entries(&path) {
            self.send(Reply::new(550, format!("{arg}: Invalid path")))?;
            return Ok(LoopControl::Continue);
        }

        self.send(Reply::new(150, "Ready to receive data"))?;
        let stream = match self.data.open() {
            Ok(stream) => stream,
            Err(e) => return self.abort_transfer(e),
        };
        match transfer::receive_file(stream, &path) {
            Ok(received) => {
                info!("{} stored {} ({received} bytes)", self.peer, path.display());
                self.send(Reply::new(226, "Transfer complete"))?;
            }
            Err(e) => {
                error!("Upload failed for {}: {e}", self.peer);
                self.send(Reply::new(426, "Connection closed; transfer aborted"))?;
            }
        }
        Ok(LoopControl::Continue)
    }

    fn abort_transfer(&mut self, err: DataChannelError) -> io::Result<LoopControl> {
        error!("Data connection unavailable for {}: {err}", self.peer);
        self.send(Reply::no_data_connection())?;
        Ok(LoopControl::Continue)
    }

    fn cmd_dele(&self, arg: &str) -> Reply {
        if arg.is_empty() {
            return Reply::new(501, "Missing file name");
        }
        let path = storage::resolve(&self.cwd, arg);
        let is_file = fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false);
        if !is_file || !storage::parent_accepts_entries(&path) {
            return Reply::new(550, format!("{arg}: Cannot delete"));
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("{} deleted {}", self.peer, path.display());
                Reply::new(250, "File deleted")
            }
            Err(e) => {
                error!("Failed to delete {}: {e}", path.display());
                Reply::new(550, format!("{arg}: Cannot delete"))
            }
        }
    }

    fn cmd_mkd(&self, arg: &str) -> Reply {
        if arg.is_empty() {
            return Reply::new(501, "Missing directory argument");
        }
        let path = storage::resolve(&self.cwd, arg);
        if path.exists() || !storage::parent_accepts_entries(&path) {
            return Reply::new(550, format!("{arg}: Cannot create directory"));
        }
        match fs::create_dir(&path) {
            Ok(()) => {
                info!("{} created directory {}", self.peer, path.display());
                Reply::new(257, format!("\"{}\" created", path.display()))
            }
            Err(e) => {
                error!("Failed to create {}: {e}", path.display());
                Reply::new(550, format!("{arg}: Cannot create directory"))
            }
        }
    }

    fn cmd_rmd(&self, arg: &str) -> Reply {
        if arg.is_empty() {
            return Reply::new(501, "Missing directory argument");
        }
        let path = storage::resolve(&self.cwd, arg);
        let removable = path.is_dir()
            && storage::is_empty_dir(&path).unwrap_or(false)
            && storage::parent_accepts_entries(&path);
        if !removable {
            return Reply::new(550, format!("{arg}: Cannot remove directory"));
        }
        match fs::remove_dir(&path) {
            Ok(()) => {
                info!("{} removed directory {}", self.peer, path.display());
                Reply::new(250, "Directory removed")
            }
            Err(e) => {
                error!("Failed to remove {}: {e}", path.display());
                Reply::new(550, format!("{arg}: Cannot remove directory"))
            }
        }
    }

    fn cmd_rnfr(&mut self, arg: &str) -> Reply {
        // A failed RNFR also discards any earlier pending source.
        self.pending_rename = None;
        if arg.is_empty() {
            return Reply::new(501, "Missing file name");
        }
        let path = storage::resolve(&self.cwd, arg);
        if path.exists() && storage::is_readable(&path) {
            self.pending_rename = Some(path);
            Reply::new(350, "Ready for RNTO")
        } else {
            Reply::new(550, format!("{arg}: No such file or directory"))
        }
    }

    /// The pending source is consumed whatever the outcome; a second RNTO
    /// always needs a fresh RNFR.
    fn cmd_rnto(&mut self, arg: &str) -> Reply {
        let Some(source) = self.pending_rename.take() else {
            return Reply::new(503, "Bad sequence of commands, send RNFR first");
        };
        if arg.is_empty() {
            return Reply::new(501, "Missing destination name");
        }
        let dest = storage::resolve(&self.cwd, arg);
        if dest.exists() || !storage::parent_accepts_entries(&dest) {
            return Reply::new(550, format!("{arg}: Invalid destination"));
        }
        match fs::rename(&source, &dest) {
            Ok(()) => {
                info!(
                    "{} renamed {} -> {}",
                    self.peer,
                    source.display(),
                    dest.display()
                );
                Reply::new(250, "Rename successful")
            }
            Err(e) => {
                error!("Rename {} -> {} failed: {e}", source.display(), dest.display());
                Reply::new(550, format!("{arg}: Rename failed"))
            }
        }
    }

    fn cmd_size(&self, arg: &str) -> Reply {
        if arg.is_empty() {
            return Reply::new(501, "Missing file name");
        }
        let path = storage::resolve(&self.cwd, arg);
        match fs::metadata(&path) {
            Ok(metadata) if !metadata.is_dir() => Reply::new(213, metadata.len().to_string()),
            _ => Reply::new(550, format!("{arg}: Not a regular file")),
        }
    }
}
