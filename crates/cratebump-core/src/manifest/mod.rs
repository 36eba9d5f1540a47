//! Cargo.toml documents and their per-run cache

mod document;
mod store;

pub use document::{DependencyEntry, ManifestDocument};
pub use store::ManifestStore;

use std::path::{Component, Path, PathBuf};

/// Normalise a path lexically, resolving `.` and `..` without touching
/// the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
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
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/ws/crates/cli/../core/./")),
            PathBuf::from("/ws/crates/core")
        );
        assert_eq!(normalize_path(Path::new("a/../../b")), PathBuf::from("../b"));
    }
}
