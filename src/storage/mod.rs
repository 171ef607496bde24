//! Uniform file access over a local filesystem or a remote FTP server
//!
//! Every path handed to a backend is a forward-slash string. Callers never
//! need to know which transport they are talking to, except for
//! [`StorageBackend::kind`], which the archive builder uses to pick a
//! strategy for getting bytes into the ZIP.

pub mod cache;
#[cfg(test)]
pub(crate) mod fake;
pub mod ftp;
pub mod local;
pub mod reconnect;
pub mod remote;
pub mod tree;

pub use local::LocalBackend;
pub use reconnect::{Checkpoint, Reconnector, DEFAULT_RECONNECT_AFTER};
pub use remote::{ConnectionSettings, RemoteBackend, RemoteSession};
pub use tree::EntryTree;

use crate::error::Result;
use serde::Serialize;
use std::path::Path;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BackendKind {
    Local,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntryKind {
    File,
    Dir,
    Other,
}

/// One directory listing row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    pub name: String,
    pub full_path: String,
    pub kind: EntryKind,
    pub size: u64,
    pub modified: Option<SystemTime>,
    /// `ls -l` style permission string, empty when the transport has none
    pub permissions: String,
}

impl EntryInfo {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dot(&self) -> bool {
        self.name == "." || self.name == ".."
    }
}

/// Visitor for [`StorageBackend::iterate`]: `(is_dir, full_path, info)`,
/// returning `false` to stop the walk
pub type Visitor<'a> = dyn FnMut(bool, &str, &EntryInfo) -> bool + 'a;

/// File and directory operations shared by local and remote installations.
///
/// Implementations are single-threaded: the remote backend keeps its session
/// and response cache in interior-mutable cells and is deliberately `!Sync`.
pub trait StorageBackend {
    fn kind(&self) -> BackendKind;

    /// Human-readable location, for messages
    fn describe(&self) -> String;

    /// Never fails; any doubt answers `false`
    fn exists(&self, path: &str) -> bool;

    fn is_file(&self, path: &str) -> bool;

    fn is_dir(&self, path: &str) -> bool;

    /// Entries under `path`, depth-first in name order when `recursive`.
    /// `.` and `..` of `path` itself are only reported with `include_dots`.
    fn list_entries(&self, path: &str, recursive: bool, include_dots: bool) -> Result<Vec<EntryInfo>>;

    fn read_file(&self, path: &str) -> Result<Vec<u8>>;

    fn read_to_string(&self, path: &str) -> Result<String> {
        let bytes = self.read_file(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Copy `remote_path` to a local file
    fn download(&self, remote_path: &str, local_path: &Path) -> Result<()>;

    /// Depth-first walk. Returns `Ok(false)` when the visitor stopped it.
    fn iterate(&self, path: &str, recursive: bool, visitor: &mut Visitor<'_>) -> Result<bool> {
        for entry in self.list_entries(path, recursive, false)? {
            if !visitor(entry.is_dir(), &entry.full_path, &entry) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn supports_reconnect(&self) -> bool {
        false
    }

    /// Re-establish the underlying session, keeping cached state
    fn reconnect(&self) -> Result<()> {
        Ok(())
    }
}

/// Every file below `path`, depth-first, as full paths
pub fn collect_files(backend: &dyn StorageBackend, path: &str) -> Result<Vec<String>> {
    let mut files = Vec::new();
    backend.iterate(path, true, &mut |is_dir, full_path, _| {
        if !is_dir {
            files.push(full_path.to_string());
        }
        true
    })?;
    Ok(files)
}
