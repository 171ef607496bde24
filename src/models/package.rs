//! Resolved entry sets and pipeline jobs

use super::{Diagnostics, ExtensionManifest, Progress};
use crate::error::Error;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// A file to archive: where to read it and what to call it inside the ZIP
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResolvedFileEntry {
    pub source_path: String,
    pub archive_entry_name: String,
}

impl ResolvedFileEntry {
    pub fn new(source_path: impl Into<String>, archive_entry_name: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            archive_entry_name: archive_entry_name.into(),
        }
    }
}

/// Ordered entries, unique on (source, destination). Re-adding a pair
/// overwrites the earlier entry in place.
#[derive(Debug, Clone, Default)]
pub struct FileSet {
    entries: Vec<ResolvedFileEntry>,
    index: HashMap<(String, String), usize>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the pair was already present
    pub fn insert(&mut self, entry: ResolvedFileEntry) -> bool {
        let key = (entry.source_path.clone(), entry.archive_entry_name.clone());
        match self.index.get(&key) {
            Some(&position) => {
                self.entries[position] = entry;
                false
            }
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(entry);
                true
            }
        }
    }

    /// Drop every entry archived under `archive_entry_name`
    pub fn remove_destination(&mut self, archive_entry_name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.archive_entry_name != archive_entry_name);
        let removed = before - self.entries.len();
        if removed > 0 {
            self.reindex();
        }
        removed
    }

    pub fn find_by_source(&self, source_path: &str) -> Option<&ResolvedFileEntry> {
        self.entries.iter().find(|e| e.source_path == source_path)
    }

    pub fn contains(&self, source_path: &str, archive_entry_name: &str) -> bool {
        self.index
            .contains_key(&(source_path.to_string(), archive_entry_name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedFileEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[ResolvedFileEntry] {
        &self.entries
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| ((e.source_path.clone(), e.archive_entry_name.clone()), i))
            .collect();
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a ResolvedFileEntry;
    type IntoIter = std::slice::Iter<'a, ResolvedFileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Archive content produced by the run itself (exported SQL)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub archive_entry_name: String,
    pub contents: Vec<u8>,
}

/// Outcome of scanning an install/uninstall SQL file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SqlScan {
    /// File starts with the `__no_data__` marker
    NoData,
    Tables(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlTableSet {
    /// Installation path of the SQL file
    pub source_path: String,
    pub scan: SqlScan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Initialized,
    RequirementsChecked,
    SectionsResolved,
    DatabaseExported,
    Archived,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initialized => "initialized",
            Self::RequirementsChecked => "requirements checked",
            Self::SectionsResolved => "sections resolved",
            Self::DatabaseExported => "database exported",
            Self::Archived => "archived",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One extension import, from parsed manifest to archive-ready entry set
#[derive(Debug, Clone)]
pub struct PackageJob {
    pub manifest: ExtensionManifest,
    /// Canonical element name, e.g. `com_helloworld`
    pub extension_name: String,
    pub entries: FileSet,
    pub generated: Vec<GeneratedFile>,
    /// Sub-extensions bundled by a package
    pub children: Vec<PackageJob>,
    pub install_sql: Vec<SqlTableSet>,
    pub uninstall_sql: Vec<SqlTableSet>,
    pub progress: Progress,
    pub diagnostics: Diagnostics,
    pub state: PipelineState,
}

impl PackageJob {
    pub fn new(manifest: ExtensionManifest, extension_name: String) -> Self {
        Self {
            manifest,
            extension_name,
            entries: FileSet::new(),
            generated: Vec::new(),
            children: Vec::new(),
            install_sql: Vec::new(),
            uninstall_sql: Vec::new(),
            progress: Progress::new(),
            diagnostics: Diagnostics::new(),
            state: PipelineState::Initialized,
        }
    }

    pub fn add_file(&mut self, source_path: impl Into<String>, archive_entry_name: impl Into<String>) {
        let entry = ResolvedFileEntry::new(source_path, archive_entry_name);
        tracing::debug!(source = %entry.source_path, entry = %entry.archive_entry_name, "resolved");
        self.entries.insert(entry);
    }

    /// Entry name the child archive gets inside the parent package
    pub fn child_archive_name(child: &PackageJob) -> String {
        format!("packages/{}.zip", child.extension_name)
    }

    /// True when install SQL opted out of data export
    pub fn sql_marked_no_data(&self) -> bool {
        self.install_sql.iter().any(|set| set.scan == SqlScan::NoData)
    }

    pub fn install_tables(&self) -> Vec<String> {
        let mut tables = Vec::new();
        for set in &self.install_sql {
            if let SqlScan::Tables(names) = &set.scan {
                for name in names {
                    if !tables.contains(name) {
                        tables.push(name.clone());
                    }
                }
            }
        }
        tables
    }
}

/// What a successful pipeline run hands back
#[derive(Debug, Clone, Serialize)]
pub struct PackageOutcome {
    pub extension_name: String,
    pub extension_type: String,
    /// `<name>` and `<version>` as the manifest states them
    pub display_name: String,
    pub version: String,
    pub archive_path: PathBuf,
    pub entries: Vec<String>,
    pub children: Vec<String>,
    pub diagnostics: Diagnostics,
    pub state: PipelineState,
}

/// A run that ended in [`PipelineState::Failed`], with everything that went wrong
#[derive(Debug)]
pub struct PipelineFailure {
    pub extension_name: Option<String>,
    /// Last state reached before failing
    pub reached: PipelineState,
    pub errors: Vec<Error>,
    pub diagnostics: Diagnostics,
}

impl PipelineFailure {
    pub fn new(reached: PipelineState, errors: Vec<Error>) -> Self {
        Self {
            extension_name: None,
            reached,
            errors,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn with_extension(mut self, name: impl Into<String>) -> Self {
        self.extension_name = Some(name.into());
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Sub-extensions that are referenced but not installed
    pub fn missing_extensions(&self) -> Vec<&Error> {
        self.errors.iter().filter(|e| e.is_missing_extension()).collect()
    }
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.extension_name {
            Some(name) => write!(f, "packaging {} failed after '{}'", name, self.reached)?,
            None => write!(f, "packaging failed after '{}'", self.reached)?,
        }
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for PipelineFailure {}

impl From<Error> for PipelineFailure {
    fn from(error: Error) -> Self {
        Self::new(PipelineState::Initialized, vec![error])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_duplicate_pair_collapses() {
        let mut set = FileSet::new();
        assert!(set.insert(ResolvedFileEntry::new("/www/a.php", "site/a.php")));
        assert!(set.insert(ResolvedFileEntry::new("/www/b.php", "site/b.php")));
        assert!(!set.insert(ResolvedFileEntry::new("/www/a.php", "site/a.php")));
        assert_eq!(set.len(), 2);
        assert_eq!(set.entries()[0].archive_entry_name, "site/a.php");
    }

    #[test]
    fn test_same_source_different_destination_is_kept() {
        let mut set = FileSet::new();
        set.insert(ResolvedFileEntry::new("/www/a.php", "site/a.php"));
        set.insert(ResolvedFileEntry::new("/www/a.php", "admin/a.php"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_remove_destination_reindexes() {
        let mut set = FileSet::new();
        set.insert(ResolvedFileEntry::new("/a", "x/a"));
        set.insert(ResolvedFileEntry::new("/b", "x/b"));
        set.insert(ResolvedFileEntry::new("/c", "x/c"));
        assert_eq!(set.remove_destination("x/b"), 1);
        assert!(set.contains("/c", "x/c"));
        assert!(!set.insert(ResolvedFileEntry::new("/c", "x/c")));
        let names: Vec<_> = set.iter().map(|e| e.archive_entry_name.as_str()).collect();
        assert_eq!(names, vec!["x/a", "x/c"]);
    }
}
