//! Filesystem collaborators: path resolution and precondition probes.
//!
//! Command handlers orchestrate `std::fs` directly; this module holds the
//! shared path arithmetic and the existence/type/permission checks that
//! gate destructive operations.

pub mod paths;

pub use paths::{normalize, resolve};

use std::fs;
use std::io;
use std::path::Path;

/// Best-effort writability probe for an existing path.
pub fn is_writable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false)
}

/// A path counts as readable when its metadata can be queried.
pub fn is_readable(path: &Path) -> bool {
    fs::metadata(path).is_ok()
}

/// True when `path` is a directory with no entries.
pub fn is_empty_dir(path: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

/// The parent of `path` exists, is a directory, and is writable - the
/// precondition for creating, deleting, or renaming an entry at `path`.
pub fn parent_accepts_entries(path: &Path) -> bool {
    match path.parent() {
        Some(parent) => parent.is_dir() && is_writable(parent),
        None => false,
    }
}
