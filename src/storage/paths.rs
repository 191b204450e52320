//! Virtual path resolution.
//!
//! Client-supplied path arguments are joined onto the session's working
//! directory and normalized textually: `.` and `..` collapse against the
//! in-memory path only. No canonicalization or containment check happens
//! here, so a crafted argument can name locations outside the initial
//! working directory (see DESIGN.md).

use std::path::{Component, Path, PathBuf};

/// Resolve a path argument against the working directory. Absolute
/// arguments replace it, relative ones append to it.
pub fn resolve(cwd: &Path, arg: &str) -> PathBuf {
    normalize(&cwd.join(arg))
}

/// Collapse `.` and `..` components without touching the filesystem.
/// `..` at the root is dropped.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_arguments_append() {
        assert_eq!(resolve(Path::new("/srv/ftp"), "sub"), PathBuf::from("/srv/ftp/sub"));
        assert_eq!(
            resolve(Path::new("/srv/ftp"), "a/b/c.txt"),
            PathBuf::from("/srv/ftp/a/b/c.txt")
        );
    }

    #[test]
    fn absolute_arguments_replace() {
        assert_eq!(resolve(Path::new("/srv/ftp"), "/etc"), PathBuf::from("/etc"));
    }

    #[test]
    fn dot_segments_collapse() {
        assert_eq!(resolve(Path::new("/srv/ftp"), "./sub/."), PathBuf::from("/srv/ftp/sub"));
        assert_eq!(resolve(Path::new("/srv/ftp"), "a/../b"), PathBuf::from("/srv/ftp/b"));
        assert_eq!(resolve(Path::new("/srv/ftp"), ".."), PathBuf::from("/srv"));
    }

    #[test]
    fn parent_of_root_stays_at_root() {
        assert_eq!(resolve(Path::new("/"), "../../.."), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn traversal_escapes_are_textual_only() {
        // Matches the reference behavior: nothing pins the result inside
        // the original working directory.
        assert_eq!(
            resolve(Path::new("/srv/ftp"), "../../etc/passwd"),
            PathBuf::from("/etc/passwd")
        );
    }
}
