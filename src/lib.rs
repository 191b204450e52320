//! rsftpd - a small FTP server.
//!
//! The crate is split into a per-connection session state machine
//! ([`session`]), a per-session data channel manager ([`transfer`]), and the
//! narrow collaborators they orchestrate: credential lookup ([`auth`]), path
//! resolution ([`storage`]), and the control-port listener ([`server`]).

pub mod auth;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod session;
pub mod storage;
pub mod transfer;

pub use server::Server;
