//! ZIP archive assembly from resolved entries

use crate::error::{Error, Result};
use crate::models::{Diagnostics, ResolvedFileEntry};
use crate::storage::{BackendKind, StorageBackend};
use crate::utils::helpers::{basename, join_path, normalize_path};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// Where the archive is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Path(PathBuf),
    /// A fresh file in the system temp directory, kept after close
    Temporary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Fail if the target exists
    Create,
    /// Truncate an existing target
    Overwrite,
}

/// Answer of the per-entry progress callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddSignal {
    Proceed,
    /// Refresh the backend session before adding the entry
    Reconnect,
    /// Stop adding; entries already written stay in the archive
    Abort,
}

/// A finalized archive
#[derive(Debug)]
pub struct ArchiveOutput {
    pub path: PathBuf,
    /// Entry names in the order they were written
    pub entries: Vec<String>,
    pub temporary: bool,
    pub diagnostics: Diagnostics,
}

pub struct ArchiveBuilder {
    writer: Option<ZipWriter<File>>,
    path: PathBuf,
    temporary: bool,
    /// Remote files are staged here; removed with the builder
    staging: Option<TempDir>,
    staged: usize,
    names: HashSet<String>,
    entries: Vec<String>,
    diagnostics: Diagnostics,
}

fn options() -> FileOptions {
    FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644)
}

impl ArchiveBuilder {
    pub fn open(target: Target, mode: OpenMode) -> Result<Self> {
        let (file, path, temporary) = match target {
            Target::Path(path) => {
                let mut open = OpenOptions::new();
                open.write(true);
                match mode {
                    OpenMode::Create => open.create_new(true),
                    OpenMode::Overwrite => open.create(true).truncate(true),
                };
                let file = open.open(&path).map_err(|e| {
                    Error::archive(format!("cannot open archive {}: {}", path.display(), e))
                })?;
                (file, path, false)
            }
            Target::Temporary => {
                let named = tempfile::Builder::new()
                    .prefix("extpack-")
                    .suffix(".zip")
                    .tempfile()
                    .map_err(|e| Error::archive(format!("cannot create temporary archive: {}", e)))?;
                let (file, path) = named
                    .keep()
                    .map_err(|e| Error::archive(format!("cannot keep temporary archive: {}", e)))?;
                (file, path, true)
            }
        };
        tracing::debug!(path = %path.display(), temporary, "archive opened");

        Ok(Self {
            writer: Some(ZipWriter::new(file)),
            path,
            temporary,
            staging: None,
            staged: 0,
            names: HashSet::new(),
            entries: Vec::new(),
            diagnostics: Diagnostics::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Directory holding staged remote files, once one has been staged
    pub fn staging_dir(&self) -> Option<&Path> {
        self.staging.as_ref().map(TempDir::path)
    }

    /// Add every entry, asking `on_entry` before each one. Returns
    /// `Ok(false)` when the callback aborted. Any failed add ends the call.
    pub fn add_entries(
        &mut self,
        entries: &[ResolvedFileEntry],
        backend: &dyn StorageBackend,
        on_entry: &mut dyn FnMut(&ResolvedFileEntry) -> AddSignal,
    ) -> Result<bool> {
        for entry in entries {
            match on_entry(entry) {
                AddSignal::Abort => {
                    tracing::info!(entry = %entry.archive_entry_name, "archiving aborted");
                    return Ok(false);
                }
                AddSignal::Reconnect => backend.reconnect()?,
                AddSignal::Proceed => {}
            }

            if backend.is_dir(&entry.source_path) {
                self.add_directory(backend, &entry.source_path, &entry.archive_entry_name)?;
            } else {
                self.add_source(backend, &entry.source_path, &entry.archive_entry_name)?;
            }
        }
        Ok(true)
    }

    fn add_directory(&mut self, backend: &dyn StorageBackend, source: &str, dest: &str) -> Result<()> {
        let root = normalize_path(source);
        let files: Vec<String> = backend
            .list_entries(&root, true, false)?
            .into_iter()
            .filter(|info| info.is_file())
            .map(|info| info.full_path)
            .collect();
        for full_path in files {
            let relative = full_path
                .strip_prefix(root.as_str())
                .unwrap_or(&full_path)
                .trim_start_matches('/');
            let name = join_path(&[dest, relative]);
            self.add_source(backend, &full_path, &name)?;
        }
        Ok(())
    }

    /// Local files go in by path; remote files are read and staged first
    fn add_source(&mut self, backend: &dyn StorageBackend, source: &str, name: &str) -> Result<bool> {
        match backend.kind() {
            BackendKind::Local => self.add_local_file(Path::new(source), name),
            BackendKind::Remote => {
                let bytes = backend.read_file(source)?;
                let staged = self.stage(source, &bytes)?;
                self.add_local_file(&staged, name)
            }
        }
    }

    fn stage(&mut self, source: &str, bytes: &[u8]) -> Result<PathBuf> {
        if self.staging.is_none() {
            let dir = TempDir::new().map_err(|e| Error::io("staging directory", e))?;
            self.staging = Some(dir);
        }
        let dir = match &self.staging {
            Some(dir) => dir.path(),
            None => return Err(Error::archive("staging directory unavailable")),
        };
        self.staged += 1;
        let staged = dir.join(format!("{:06}-{}", self.staged, basename(source)));
        fs::write(&staged, bytes).map_err(|e| Error::io(staged.display().to_string(), e))?;
        Ok(staged)
    }

    /// Returns `false` when an entry of that name was already written
    pub fn add_local_file(&mut self, path: &Path, name: &str) -> Result<bool> {
        if !self.claim(name) {
            return Ok(false);
        }
        let mut file = File::open(path).map_err(|e| Error::io(path.display().to_string(), e))?;
        let writer = self.writer()?;
        writer.start_file(name, options())?;
        io::copy(&mut file, writer).map_err(|e| Error::io(path.display().to_string(), e))?;
        self.entries.push(name.to_string());
        Ok(true)
    }

    /// Write generated content straight into the archive
    pub fn add_bytes(&mut self, name: &str, contents: &[u8]) -> Result<bool> {
        if !self.claim(name) {
            return Ok(false);
        }
        let writer = self.writer()?;
        writer.start_file(name, options())?;
        writer
            .write_all(contents)
            .map_err(|e| Error::archive(format!("cannot write {}: {}", name, e)))?;
        self.entries.push(name.to_string());
        Ok(true)
    }

    fn claim(&mut self, name: &str) -> bool {
        if self.names.insert(name.to_string()) {
            tracing::debug!(entry = name, "adding to archive");
            return true;
        }
        self.diagnostics.add_warning(
            format!("duplicate archive entry '{}' skipped", name),
            Some(self.path.display().to_string()),
        );
        false
    }

    fn writer(&mut self) -> Result<&mut ZipWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| Error::archive("archive is already closed"))
    }

    /// Finalize the archive and release the staging directory
    pub fn close(mut self) -> Result<ArchiveOutput> {
        let mut writer = self.writer.take().ok_or_else(|| Error::archive("archive is already closed"))?;
        writer.finish().map_err(|e| {
            Error::archive(format!("cannot finalize {}: {}", self.path.display(), e))
        })?;
        self.staging.take();

        tracing::info!(path = %self.path.display(), entries = self.entries.len(), "archive finalized");
        Ok(ArchiveOutput {
            path: self.path.clone(),
            entries: std::mem::take(&mut self.entries),
            temporary: self.temporary,
            diagnostics: std::mem::take(&mut self.diagnostics),
        })
    }
}

impl Drop for ArchiveBuilder {
    fn drop(&mut self) {
        // An unfinished temporary archive is useless to anyone
        if self.writer.take().is_some() && self.temporary {
            let _ = fs::remove_file(&self.path);
        }
    }
}
