//! Remote filesystem capability abstraction.
//!
//! [`RemoteFilesystem`] is the uniform interface every storage backend
//! implements — list a directory, stat a path, download a file — so that
//! the tree model and the fetch orchestrator never depend on a concrete
//! backend. Handles are constructed by a
//! [`Connector`](crate::connector::Connector) from user-supplied
//! credentials and shared via `Arc`.

pub mod path;

use serde::{Deserialize, Serialize};

use crate::errors::FsError;

/// Whether a remote entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    File,
    Directory,
}

/// Metadata snapshot for one remote entry.
///
/// Taken once at node-construction time and never refreshed — remote
/// mutation is not observed (acceptable for a browse-and-fetch tool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryInfo {
    pub kind: EntryKind,
    /// Size in bytes. Meaningful for files only; directories report 0.
    pub size: u64,
}

impl EntryInfo {
    pub fn file(size: u64) -> Self {
        Self {
            kind: EntryKind::File,
            size,
        }
    }

    pub fn directory() -> Self {
        Self {
            kind: EntryKind::Directory,
            size: 0,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Blocking capability interface over one remote storage technology.
///
/// All paths are absolute and POSIX-style (`/bucket/key`, `/home/user`).
/// Implementations make no ordering guarantee for [`list()`](Self::list);
/// the tree model imposes one.
///
/// Every method blocks on network I/O. The tree-expansion path calls
/// `list`/`stat` synchronously on the interactive thread (an accepted
/// latency trade-off); `fetch` must be routed through a worker, which the
/// [`FetchOrchestrator`](crate::fetch::FetchOrchestrator) does.
pub trait RemoteFilesystem: Send + Sync {
    /// List the absolute child paths of a directory.
    fn list(&self, path: &str) -> Result<Vec<String>, FsError>;

    /// Get metadata for a single path.
    fn stat(&self, path: &str) -> Result<EntryInfo, FsError>;

    /// Download a remote file to the given local path, blocking until done.
    fn fetch(&self, remote_path: &str, local_path: &std::path::Path) -> Result<(), FsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify RemoteFilesystem is object-safe and shareable.
    fn _assert_object_safe(_: &dyn RemoteFilesystem) {}
    fn _assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn remote_filesystem_is_send_sync() {
        _assert_send_sync::<std::sync::Arc<dyn RemoteFilesystem>>();
    }

    #[test]
    fn entry_info_constructors() {
        let f = EntryInfo::file(2048);
        assert!(f.is_file());
        assert!(!f.is_dir());
        assert_eq!(f.size, 2048);

        let d = EntryInfo::directory();
        assert!(d.is_dir());
        assert_eq!(d.size, 0);
    }
}
