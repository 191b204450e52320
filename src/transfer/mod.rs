//! Data channel management and transfer primitives.
//!
//! One [`DataChannel`] lives inside each session; it owns the negotiated
//! active/passive mode and produces one connected socket per transfer
//! command. The copy primitives in [`file_ops`] then move bytes between
//! that socket and the filesystem.

pub mod data_channel;
pub mod file_ops;

pub use data_channel::{
    DataChannel, DataChannelMode, EprtError, parse_eprt_argument, parse_port_argument,
};
pub use file_ops::{receive_file, send_file, send_listing};
