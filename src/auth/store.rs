//! Credential storage and lookup.

use log::{info, warn};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

/// Keyed username/password lookup consulted by USER and PASS.
///
/// Implementations must tolerate concurrent reads: one store is shared by
/// every session worker.
pub trait CredentialStore: Send + Sync {
    /// Does this username exist at all?
    fn username_exists(&self, username: &str) -> bool;

    /// Does this username/password pair match?
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// In-memory store, loaded once at startup and read-only afterwards.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    users: HashMap<String, String>,
}

impl MemoryCredentials {
    pub fn new(users: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            users: users.into_iter().collect(),
        }
    }

    /// Loads a credential file with one `name=password` entry per line.
    /// Blank lines and `#` comments are skipped; lines without `=` are
    /// logged and ignored.
    pub fn load(path: &Path) -> io::Result<Self> {
        let raw = fs::read_to_string(path)?;
        let mut users = HashMap::new();

        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once('=') {
                Some((name, password)) => {
                    users.insert(name.trim().to_string(), password.trim().to_string());
                }
                None => warn!("Ignoring malformed credential line: {line}"),
            }
        }

        info!("Loaded {} user(s) from {}", users.len(), path.display());
        Ok(Self { users })
    }
}

impl CredentialStore for MemoryCredentials {
    fn username_exists(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    fn verify(&self, username: &str, password: &str) -> bool {
        self.users.get(username).map(String::as_str) == Some(password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryCredentials {
        MemoryCredentials::new([
            ("alice".to_string(), "alice123".to_string()),
            ("bob".to_string(), "hunter2".to_string()),
        ])
    }

    #[test]
    fn lookup_and_verify() {
        let creds = store();
        assert!(creds.username_exists("alice"));
        assert!(!creds.username_exists("mallory"));
        assert!(creds.verify("alice", "alice123"));
        assert!(!creds.verify("alice", "wrong"));
        assert!(!creds.verify("mallory", "anything"));
    }

    #[test]
    fn load_skips_comments_and_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.conf");
        fs::write(
            &path,
            "# test users\n\nalice=alice123\n  bob = hunter2  \nbroken-line\n",
        )
        .unwrap();

        let creds = MemoryCredentials::load(&path).unwrap();
        assert!(creds.verify("alice", "alice123"));
        assert!(creds.verify("bob", "hunter2"));
        assert!(!creds.username_exists("broken-line"));
    }

    #[test]
    fn load_missing_file_is_an_error() {
        assert!(MemoryCredentials::load(Path::new("/nonexistent/users.conf")).is_err());
    }
}
