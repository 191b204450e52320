//! Error types shared across server modules.

use std::io;
use thiserror::Error;

/// Failure to produce a data connection for a transfer command.
///
/// All variants map to a `425` reply at the protocol layer; the control
/// session always survives them.
#[derive(Debug, Error)]
pub enum DataChannelError {
    /// Neither PORT/EPRT nor PASV has been issued on this session.
    #[error("no data connection negotiated")]
    NoMode,

    /// The passive listener timed out waiting for the client to connect.
    #[error("timed out waiting for data connection on port {0}")]
    AcceptTimeout(u16),

    #[error(transparent)]
    Io(#[from] io::Error),
}
