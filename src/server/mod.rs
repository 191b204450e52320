//! Control-port listener and worker dispatch.

pub mod core;

pub use core::Server;
