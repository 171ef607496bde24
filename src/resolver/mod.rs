//! Manifest declarations to concrete (source, archive entry) pairs
//!
//! Sections are walked in the order the manifest declares them, restricted
//! to the extension type's section plan. Within a section declaration
//! order is kept. Resolution is fail-fast: the first missing file or
//! failed listing aborts the extension.

pub mod languages;
pub mod sections;
pub mod sql;
pub mod subpackages;

use crate::error::{Error, Result};
use crate::models::{
    ExtensionManifest, Installation, PackageJob, PipelineState, Progress, ResolvedFileEntry,
    SectionKind, SectionRule,
};
use crate::parser::manifest::{check_requirements, read_manifest};
use crate::storage::{Checkpoint, Reconnector, StorageBackend};
use crate::utils::helpers::{join_path, normalize_path};

pub use subpackages::SubExtension;

pub struct FileSetResolver<'a> {
    backend: &'a dyn StorageBackend,
    installation: &'a Installation,
    reconnector: Reconnector,
}

impl<'a> FileSetResolver<'a> {
    pub fn new(backend: &'a dyn StorageBackend, installation: &'a Installation) -> Self {
        Self {
            backend,
            installation,
            reconnector: Reconnector::default(),
        }
    }

    pub fn with_reconnector(mut self, reconnector: Reconnector) -> Self {
        self.reconnector = reconnector;
        self
    }

    pub fn backend(&self) -> &'a dyn StorageBackend {
        self.backend
    }

    pub fn installation(&self) -> &'a Installation {
        self.installation
    }

    /// Check required sections, derive the element name and seed the entry
    /// set with the manifest itself.
    pub fn start_job(&self, manifest: ExtensionManifest) -> Result<PackageJob> {
        check_requirements(&manifest)?;
        let extension_name = manifest.element_name()?;
        let manifest_path = manifest.source_path.clone();
        let manifest_name = manifest.file_name().to_string();

        let mut job = PackageJob::new(manifest, extension_name);
        job.add_file(manifest_path, manifest_name);
        job.state = PipelineState::RequirementsChecked;
        Ok(job)
    }

    /// Read, check and fully resolve the extension whose manifest is at `manifest_path`
    pub fn prepare(&self, manifest_path: &str) -> std::result::Result<PackageJob, Vec<Error>> {
        let manifest = read_manifest(self.backend, manifest_path).map_err(|e| vec![e])?;
        let mut job = self.start_job(manifest).map_err(|e| vec![e])?;
        self.resolve(&mut job)?;
        Ok(job)
    }

    /// Resolve every planned section into `job.entries`
    pub fn resolve(&self, job: &mut PackageJob) -> std::result::Result<(), Vec<Error>> {
        let plan = job.manifest.extension_type.section_plan();
        for rule in ordered_plan(&job.manifest, plan) {
            tracing::debug!(extension = %job.extension_name, section = rule.kind.name(), "resolving section");
            self.resolve_section(job, rule)?;
            self.reconnector
                .checkpoint(self.backend, &mut job.progress, rule.kind.name(), Checkpoint::Boundary)
                .map_err(|e| vec![e])?;
        }
        job.state = PipelineState::SectionsResolved;
        tracing::info!(
            extension = %job.extension_name,
            entries = job.entries.len(),
            children = job.children.len(),
            "sections resolved"
        );
        Ok(())
    }

    fn resolve_section(&self, job: &mut PackageJob, rule: SectionRule) -> std::result::Result<(), Vec<Error>> {
        if !job.manifest.has_element(rule.kind.name()) {
            if rule.required {
                return Err(vec![Error::MissingSections {
                    names: vec![rule.kind.name().to_string()],
                }]);
            }
            let location = Some(job.manifest.file_name().to_string());
            job.diagnostics
                .add_warning(format!("'{}' section is missing", rule.kind.name()), location);
            return Ok(());
        }

        let single = |result: Result<()>| result.map_err(|e| vec![e]);
        match rule.kind {
            SectionKind::Files if job.manifest.extension_type == crate::models::ExtensionType::Package => {
                self.resolve_package_files(job)
            }
            SectionKind::Files => single(self.resolve_files(job)),
            SectionKind::Administration => single(self.resolve_administration(job)),
            SectionKind::Languages => single(self.resolve_root_languages(job)),
            SectionKind::Media => single(self.resolve_media(job)),
            SectionKind::Scriptfile => single(self.resolve_scriptfile(job)),
            SectionKind::Install | SectionKind::Uninstall | SectionKind::UpdateServers => Ok(()),
        }
    }

    /// Every file below `source_dir`, mapped under `dest_dir` with its relative path kept
    pub fn expand_folder(&self, source_dir: &str, dest_dir: &str) -> Result<Vec<ResolvedFileEntry>> {
        let root = normalize_path(source_dir);
        let mut entries = Vec::new();
        self.backend.iterate(&root, true, &mut |is_dir, full_path, _| {
            if !is_dir {
                let relative = full_path
                    .strip_prefix(root.as_str())
                    .unwrap_or(full_path)
                    .trim_start_matches('/');
                entries.push(ResolvedFileEntry::new(full_path, join_path(&[dest_dir, relative])));
            }
            true
        })?;
        Ok(entries)
    }

    /// Add one declared path: a file as-is, a directory expanded, anything else is NotFound
    fn add_declared(&self, job: &mut PackageJob, source: &str, dest: &str) -> Result<()> {
        if self.backend.is_file(source) {
            job.add_file(source, dest);
        } else if self.backend.is_dir(source) {
            for entry in self.expand_folder(source, dest)? {
                job.entries.insert(entry);
            }
        } else {
            return Err(Error::not_found(source));
        }
        job.progress.add_items(1);
        Ok(())
    }

    /// Expand a declared folder; a missing folder fails the listing
    fn add_folder(&self, job: &mut PackageJob, source: &str, dest: &str) -> Result<()> {
        let entries = self.expand_folder(source, dest)?;
        job.progress.add_items(entries.len());
        for entry in entries {
            tracing::debug!(source = %entry.source_path, entry = %entry.archive_entry_name, "resolved");
            job.entries.insert(entry);
        }
        Ok(())
    }

    fn item_checkpoint(&self, progress: &mut Progress, name: &str) -> Result<()> {
        self.reconnector
            .checkpoint(self.backend, progress, name, Checkpoint::Item)
            .map(|_| ())
    }
}

/// The type's section plan, reordered to follow the manifest. Planned
/// sections the manifest lacks keep their plan position at the end.
fn ordered_plan(manifest: &ExtensionManifest, plan: &[SectionRule]) -> Vec<SectionRule> {
    let mut ordered: Vec<SectionRule> = manifest
        .section_order()
        .into_iter()
        .filter_map(|kind| plan.iter().find(|rule| rule.kind == kind).copied())
        .collect();
    for rule in plan {
        if !ordered.iter().any(|r| r.kind == rule.kind) {
            ordered.push(*rule);
        }
    }
    ordered
}
