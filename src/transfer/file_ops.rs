//! Bulk copy primitives for the data channel.
//!
//! Each primitive consumes the data-side stream so the socket closes when
//! the copy returns, on success and on failure alike. Copies run through a
//! fixed 4 KiB buffer until end-of-stream on the source side.

use chrono::{DateTime, Local};
use std::fs::{self, File, Metadata};
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::SystemTime;

const TRANSFER_BUFFER_SIZE: usize = 4096;

/// Stream a file's bytes to the data connection. Returns the byte count.
pub fn send_file<W: Write>(mut out: W, path: &Path) -> io::Result<u64> {
    let mut file = File::open(path)?;
    let mut buffer = [0u8; TRANSFER_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        out.write_all(&buffer[..n])?;
        total += n as u64;
    }
    out.flush()?;
    Ok(total)
}

/// Read the data connection to end-of-stream into a new file at `path`,
/// replacing any existing file. Returns the byte count.
pub fn receive_file<R: Read>(mut input: R, path: &Path) -> io::Result<u64> {
    let mut file = File::create(path)?;
    let mut buffer = [0u8; TRANSFER_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = input.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n])?;
        total += n as u64;
    }
    file.flush()?;
    Ok(total)
}

/// Write a LIST response for `dir`: one line per entry, in whatever order
/// the filesystem enumerates them. Returns the entry count.
pub fn send_listing<W: Write>(mut out: W, dir: &Path) -> io::Result<usize> {
    let mut entries = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        let line = format_list_line(&entry.file_name().to_string_lossy(), &metadata);
        out.write_all(line.as_bytes())?;
        entries += 1;
    }
    out.flush()?;
    Ok(entries)
}

/// One fixed-width listing line:
/// `-rw-r--r-- 1 ftp ftp       1024 Aug 23 10:30 name`.
/// Directories show `drwxr-xr-x` and size 0.
fn format_list_line(name: &str, metadata: &Metadata) -> String {
    let permissions = if metadata.is_dir() {
        "drwxr-xr-x"
    } else {
        "-rw-r--r--"
    };
    let size = if metadata.is_dir() { 0 } else { metadata.len() };
    let modified: DateTime<Local> = metadata
        .modified()
        .unwrap_or(SystemTime::UNIX_EPOCH)
        .into();
    format!(
        "{} 1 ftp ftp {:>10} {} {}\r\n",
        permissions,
        size,
        modified.format("%b %d %H:%M"),
        name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_file_copies_all_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &payload).unwrap();

        let mut sink = Vec::new();
        let sent = send_file(&mut sink, &path).unwrap();
        assert_eq!(sent, payload.len() as u64);
        assert_eq!(sink, payload);
    }

    #[test]
    fn receive_file_writes_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.bin");
        fs::write(&path, b"old contents").unwrap();

        let payload = b"fresh contents".to_vec();
        let received = receive_file(payload.as_slice(), &path).unwrap();
        assert_eq!(received, payload.len() as u64);
        assert_eq!(fs::read(&path).unwrap(), payload);
    }

    #[test]
    fn listing_has_one_line_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let mut sink = Vec::new();
        let entries = send_listing(&mut sink, dir.path()).unwrap();
        assert_eq!(entries, 2);

        let listing = String::from_utf8(sink).unwrap();
        let lines: Vec<&str> = listing.split_terminator("\r\n").collect();
        assert_eq!(lines.len(), 2);

        let file_line = lines.iter().find(|l| l.ends_with("a.txt")).unwrap();
        assert!(file_line.starts_with("-rw-r--r-- 1 ftp ftp"));
        assert!(file_line.contains("         5 "));

        let dir_line = lines.iter().find(|l| l.ends_with("sub")).unwrap();
        assert!(dir_line.starts_with("drwxr-xr-x 1 ftp ftp"));
        assert!(dir_line.contains("         0 "));
    }

    #[test]
    fn listing_of_empty_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = Vec::new();
        assert_eq!(send_listing(&mut sink, dir.path()).unwrap(), 0);
        assert!(sink.is_empty());
    }
}
