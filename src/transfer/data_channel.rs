//! Per-session data connection management.
//!
//! Passive allocation is reserve-then-release: PASV binds an ephemeral
//! listener only to learn which port the platform assigns, drops it, and
//! the port is bound again when the transfer command arrives. Between those
//! two steps the port is not held, so another process can steal it; the two
//! operations are kept separate so a held-open listener could replace them
//! without changing the PASV contract (see DESIGN.md).

use log::{debug, info, warn};
use std::io::{self, ErrorKind};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::DataChannelError;

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Negotiated transfer mode. At most one is meaningful at a time; setting
/// one overwrites the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataChannelMode {
    Unset,
    /// PORT/EPRT target the server connects out to.
    Active(SocketAddr),
    /// Port previously announced via PASV, re-bound at transfer time.
    Passive(u16),
}

/// Owns one session's data-connection state. Not cleared after a transfer:
/// a client may reuse the negotiated target for the next command.
#[derive(Debug)]
pub struct DataChannel {
    mode: DataChannelMode,
    accept_timeout: Duration,
}

impl DataChannel {
    pub fn new(accept_timeout: Duration) -> Self {
        Self {
            mode: DataChannelMode::Unset,
            accept_timeout,
        }
    }

    pub fn mode(&self) -> DataChannelMode {
        self.mode
    }

    /// PORT/EPRT: record the client-supplied target. No connection is made
    /// and the target is not probed for reachability.
    pub fn set_active_target(&mut self, target: SocketAddr) {
        self.mode = DataChannelMode::Active(target);
    }

    /// PASV: learn a free port from the platform, release it immediately,
    /// and remember the number for the next transfer command.
    pub fn reserve_passive_port(&mut self) -> io::Result<u16> {
        let port = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0))?
            .local_addr()?
            .port();
        self.mode = DataChannelMode::Passive(port);
        Ok(port)
    }

    /// Produce one connected data socket for a transfer command.
    pub fn open(&self) -> Result<TcpStream, DataChannelError> {
        match self.mode {
            DataChannelMode::Unset => Err(DataChannelError::NoMode),
            DataChannelMode::Active(target) => {
                debug!("Connecting to active-mode target {target}");
                Ok(TcpStream::connect(target)?)
            }
            DataChannelMode::Passive(port) => self.accept_on_port(port),
        }
    }

    /// Re-bind the announced port and wait for exactly one client
    /// connection. The listener is dropped whatever the outcome.
    fn accept_on_port(&self, port: u16) -> Result<TcpStream, DataChannelError> {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))?;
        listener.set_nonblocking(true)?;

        let deadline = Instant::now() + self.accept_timeout;
        loop {
            match listener.accept() {
                Ok((stream, peer)) => {
                    info!("Data connection accepted from {peer}");
                    stream.set_nonblocking(false)?;
                    return Ok(stream);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        warn!("Timed out waiting for data connection on port {port}");
                        return Err(DataChannelError::AcceptTimeout(port));
                    }
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Parse the legacy `h1,h2,h3,h4,p1,p2` PORT argument.
pub fn parse_port_argument(arg: &str) -> Option<SocketAddr> {
    let fields: Vec<&str> = arg.split(',').collect();
    if fields.len() != 6 {
        return None;
    }
    let mut octets = [0u8; 4];
    for (octet, field) in octets.iter_mut().zip(&fields[..4]) {
        *octet = field.parse().ok()?;
    }
    let p1: u16 = fields[4].parse::<u8>().ok()?.into();
    let p2: u16 = fields[5].parse::<u8>().ok()?.into();
    Some(SocketAddr::from((Ipv4Addr::from(octets), p1 * 256 + p2)))
}

#[derive(Debug, PartialEq, Eq)]
pub enum EprtError {
    /// Argument does not match `|proto|host|port|`.
    Malformed,
    /// Protocol family other than 1 (IPv4) or 2 (IPv6).
    UnsupportedProtocol,
}

/// Parse the `|proto|host|port|` EPRT argument. The first character is the
/// delimiter; proto must be "1" or "2".
pub fn parse_eprt_argument(arg: &str) -> Result<SocketAddr, EprtError> {
    let delim = arg.chars().next().ok_or(EprtError::Malformed)?;
    let fields: Vec<&str> = arg.split(delim).collect();
    // "|1|host|port|" splits into ["", "1", host, port, ""]
    if fields.len() != 5 || !fields[0].is_empty() || !fields[4].is_empty() {
        return Err(EprtError::Malformed);
    }
    match fields[1] {
        "1" | "2" => {}
        _ => return Err(EprtError::UnsupportedProtocol),
    }
    let host: IpAddr = fields[2].parse().map_err(|_| EprtError::Malformed)?;
    let port: u16 = fields[3].parse().map_err(|_| EprtError::Malformed)?;
    Ok(SocketAddr::new(host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_argument_decodes_host_and_port() {
        let addr = parse_port_argument("127,0,0,1,7,208").unwrap();
        assert_eq!(addr, "127.0.0.1:2000".parse().unwrap());
    }

    #[test]
    fn port_argument_rejects_malformed_input() {
        assert!(parse_port_argument("").is_none());
        assert!(parse_port_argument("127,0,0,1,7").is_none());
        assert!(parse_port_argument("127,0,0,1,7,208,9").is_none());
        assert!(parse_port_argument("256,0,0,1,7,208").is_none());
        assert!(parse_port_argument("127,0,0,1,x,208").is_none());
    }

    #[test]
    fn eprt_argument_accepts_both_families() {
        assert_eq!(
            parse_eprt_argument("|1|127.0.0.1|2000|"),
            Ok("127.0.0.1:2000".parse().unwrap())
        );
        assert_eq!(parse_eprt_argument("|2|::1|2000|"), Ok("[::1]:2000".parse().unwrap()));
    }

    #[test]
    fn eprt_argument_rejects_bad_protocol() {
        assert_eq!(
            parse_eprt_argument("|3|127.0.0.1|2000|"),
            Err(EprtError::UnsupportedProtocol)
        );
    }

    #[test]
    fn eprt_argument_rejects_malformed_input() {
        assert_eq!(parse_eprt_argument(""), Err(EprtError::Malformed));
        assert_eq!(parse_eprt_argument("|1|127.0.0.1|"), Err(EprtError::Malformed));
        assert_eq!(parse_eprt_argument("|1|nonsense|2000|"), Err(EprtError::Malformed));
        assert_eq!(parse_eprt_argument("|1|127.0.0.1|2000"), Err(EprtError::Malformed));
    }

    #[test]
    fn modes_overwrite_each_other() {
        let mut channel = DataChannel::new(Duration::from_secs(1));
        assert_eq!(channel.mode(), DataChannelMode::Unset);

        let target = "127.0.0.1:2000".parse().unwrap();
        channel.set_active_target(target);
        assert_eq!(channel.mode(), DataChannelMode::Active(target));

        let port = channel.reserve_passive_port().unwrap();
        assert!(port > 0);
        assert_eq!(channel.mode(), DataChannelMode::Passive(port));

        channel.set_active_target(target);
        assert_eq!(channel.mode(), DataChannelMode::Active(target));
    }

    #[test]
    fn open_without_mode_fails() {
        let channel = DataChannel::new(Duration::from_secs(1));
        assert!(matches!(channel.open(), Err(DataChannelError::NoMode)));
    }

    #[test]
    fn passive_accept_times_out_without_client() {
        let mut channel = DataChannel::new(Duration::from_millis(200));
        let port = channel.reserve_passive_port().unwrap();
        match channel.open() {
            Err(DataChannelError::AcceptTimeout(p)) => assert_eq!(p, port),
            other => panic!("expected accept timeout, got {other:?}"),
        }
    }
}
