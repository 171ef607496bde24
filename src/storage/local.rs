//! Local filesystem backend

use super::{BackendKind, EntryInfo, EntryKind, StorageBackend};
use crate::error::{Error, Result};
use crate::utils::helpers::{join_path, normalize_path};
use std::fs::{self, Metadata};
use std::io;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalBackend;

impl LocalBackend {
    pub fn new() -> Self {
        Self
    }
}

fn read_error(path: &str, err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        Error::not_found(path)
    } else {
        Error::io(path, err)
    }
}

fn entry_kind(meta: &Metadata) -> EntryKind {
    if meta.is_dir() {
        EntryKind::Dir
    } else if meta.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    }
}

#[cfg(unix)]
fn permissions_display(meta: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;

    let mode = meta.permissions().mode();
    let mut display = String::with_capacity(10);
    display.push(match entry_kind(meta) {
        EntryKind::Dir => 'd',
        EntryKind::File => '-',
        EntryKind::Other => '?',
    });
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        display.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        display.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        display.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    display
}

#[cfg(not(unix))]
fn permissions_display(meta: &Metadata) -> String {
    if meta.permissions().readonly() { "r--".to_string() } else { "rw-".to_string() }
}

fn entry_info(name: &str, full_path: String, meta: &Metadata) -> EntryInfo {
    EntryInfo {
        name: name.to_string(),
        full_path,
        kind: entry_kind(meta),
        size: if meta.is_file() { meta.len() } else { 0 },
        modified: meta.modified().ok(),
        permissions: permissions_display(meta),
    }
}

impl StorageBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn describe(&self) -> String {
        "local filesystem".to_string()
    }

    fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }

    fn is_file(&self, path: &str) -> bool {
        Path::new(path).is_file()
    }

    fn is_dir(&self, path: &str) -> bool {
        Path::new(path).is_dir()
    }

    fn list_entries(&self, path: &str, recursive: bool, include_dots: bool) -> Result<Vec<EntryInfo>> {
        let root = normalize_path(path);
        let meta = fs::metadata(path).map_err(|e| Error::io(path, e))?;
        if !meta.is_dir() {
            return Err(Error::io(
                path,
                io::Error::new(io::ErrorKind::Other, "not a directory"),
            ));
        }

        let mut entries = Vec::new();
        if include_dots {
            entries.push(entry_info(".", join_path(&[&root, "."]), &meta));
            let parent = Path::new(path).parent().unwrap_or_else(|| Path::new(path));
            let parent_meta = fs::metadata(parent).unwrap_or_else(|_| meta.clone());
            entries.push(entry_info("..", join_path(&[&root, ".."]), &parent_meta));
        }

        let walker = WalkDir::new(path)
            .min_depth(1)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| Error::io(path, io::Error::from(e)))?;
            let relative = entry
                .path()
                .strip_prefix(path)
                .map_err(|e| Error::io(path, io::Error::new(io::ErrorKind::Other, e)))?;
            let meta = entry.metadata().map_err(|e| Error::io(path, io::Error::from(e)))?;
            let name = entry.file_name().to_string_lossy();
            let full_path = join_path(&[&root, &relative.to_string_lossy()]);
            entries.push(entry_info(&name, full_path, &meta));
        }

        Ok(entries)
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| read_error(path, e))
    }

    fn download(&self, remote_path: &str, local_path: &Path) -> Result<()> {
        if !self.is_file(remote_path) {
            return Err(Error::not_found(remote_path));
        }
        if Path::new(remote_path) == local_path {
            return Ok(());
        }
        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent.to_string_lossy(), e))?;
        }
        fs::copy(remote_path, local_path).map_err(|e| read_error(remote_path, e))?;
        Ok(())
    }
}
