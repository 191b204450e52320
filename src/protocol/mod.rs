//! FTP protocol surface.
//!
//! Command parsing and reply formatting for the control channel.

pub mod commands;
pub mod replies;

pub use commands::{Command, parse_command};
pub use replies::Reply;
