//! One extension import, from manifest to saved archive
//!
//! `Initialized -> RequirementsChecked -> SectionsResolved -> [DatabaseExported]
//! -> Archived -> Done`, with `Failed` reachable from every step. A failure
//! carries every error collected so far plus the run's diagnostics.

use super::builder::{AddSignal, ArchiveBuilder, ArchiveOutput, OpenMode, Target};
use super::database::{generated_files, DbExporter};
use super::save_archive;
use crate::error::{Error, Result};
use crate::models::{
    ExtensionType, Installation, PackageJob, PackageOutcome, PipelineFailure, PipelineState,
    ResolvedFileEntry,
};
use crate::parser::manifest::read_manifest;
use crate::resolver::FileSetResolver;
use crate::storage::{Reconnector, StorageBackend};
use crate::validator::validate_job;
use crate::PackageOptions;
use std::fs;
use std::path::Path;

type EntryObserver<'a> = Box<dyn Fn(&ResolvedFileEntry) + 'a>;

pub struct PackagePipeline<'a> {
    backend: &'a dyn StorageBackend,
    installation: &'a Installation,
    options: PackageOptions,
    exporter: Option<&'a dyn DbExporter>,
    observer: Option<EntryObserver<'a>>,
}

impl<'a> PackagePipeline<'a> {
    pub fn new(backend: &'a dyn StorageBackend, installation: &'a Installation, options: PackageOptions) -> Self {
        Self {
            backend,
            installation,
            options,
            exporter: None,
            observer: None,
        }
    }

    pub fn with_exporter(mut self, exporter: &'a dyn DbExporter) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Called with every entry just before it is written to an archive
    pub fn with_observer(mut self, observer: impl Fn(&ResolvedFileEntry) + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn options(&self) -> &PackageOptions {
        &self.options
    }

    pub fn resolver(&self) -> FileSetResolver<'a> {
        FileSetResolver::new(self.backend, self.installation)
            .with_reconnector(Reconnector::new(self.options.reconnect_after))
    }

    /// Installed manifest of an element, its type taken from the prefix
    pub fn locate(&self, element: &str) -> Result<String> {
        let extension_type = ExtensionType::from_element(element).ok_or_else(|| Error::InvalidName {
            file: element.to_string(),
        })?;
        self.installation
            .locate_manifest(self.backend, extension_type, element, None)
    }

    /// Parse, check and resolve an extension; exports its tables when asked to
    pub fn prepare(&self, manifest_path: &str) -> std::result::Result<PackageJob, PipelineFailure> {
        let resolver = self.resolver();
        let manifest = read_manifest(self.backend, manifest_path)
            .map_err(|e| PipelineFailure::new(PipelineState::Initialized, vec![e]))?;
        let mut job = resolver
            .start_job(manifest)
            .map_err(|e| PipelineFailure::new(PipelineState::Initialized, vec![e]))?;
        tracing::info!(extension = %job.extension_name, kind = %job.manifest.extension_type, "requirements checked");

        if let Err(errors) = resolver.resolve(&mut job) {
            return Err(fail(job, errors));
        }
        if self.options.export_database {
            if let Err(e) = self.export_database(&resolver, &mut job) {
                return Err(fail(job, vec![e]));
            }
        }
        Ok(job)
    }

    /// Full run: prepare, validate, archive and move the archive into `dest_dir`
    pub fn run(&self, manifest_path: &str, dest_dir: &Path) -> std::result::Result<PackageOutcome, PipelineFailure> {
        let mut job = self.prepare(manifest_path)?;
        if let Err(problems) = validate_job(&job, self.backend) {
            return Err(fail(job, problems));
        }

        let output = match self.archive(&mut job, Target::Temporary) {
            Ok(output) => output,
            Err(e) => return Err(fail(job, vec![e])),
        };

        let saved = save_archive(
            &output.path,
            dest_dir,
            &job.extension_name,
            self.options.rename_existing,
            &mut job.diagnostics,
        );
        let archive_path = match saved {
            Ok(path) => path,
            Err(e) => {
                let _ = fs::remove_file(&output.path);
                return Err(fail(job, vec![e]));
            }
        };
        job.state = PipelineState::Done;
        tracing::info!(extension = %job.extension_name, path = %archive_path.display(), "package done");

        Ok(PackageOutcome {
            extension_name: job.extension_name,
            extension_type: job.manifest.extension_type.to_string(),
            display_name: job.manifest.name().to_string(),
            version: job.manifest.version().to_string(),
            archive_path,
            entries: output.entries,
            children: job.children.iter().map(|c| c.extension_name.clone()).collect(),
            diagnostics: job.diagnostics,
            state: job.state,
        })
    }

    /// Write a resolved job, sub-packages first, into one archive
    pub fn archive(&self, job: &mut PackageJob, target: Target) -> Result<ArchiveOutput> {
        let mut builder = ArchiveBuilder::open(target, OpenMode::Overwrite)?;

        for child in job.children.iter_mut() {
            let child_output = self.archive(child, Target::Temporary)?;
            let added = builder.add_local_file(&child_output.path, &PackageJob::child_archive_name(child));
            let _ = fs::remove_file(&child_output.path);
            added?;
            child.state = PipelineState::Done;
            job.diagnostics
                .absorb(&child.extension_name, std::mem::take(&mut child.diagnostics));
        }

        let reconnector = Reconnector::new(self.options.reconnect_after);
        let backend = self.backend;
        let observer = self.observer.as_deref();
        let progress = &mut job.progress;
        progress.reset_interval();
        let completed = builder.add_entries(job.entries.entries(), backend, &mut |entry| {
            if let Some(observe) = observer {
                observe(entry);
            }
            progress.add_items(1);
            if reconnector.is_due(backend, progress) {
                progress.reset_interval();
                AddSignal::Reconnect
            } else {
                AddSignal::Proceed
            }
        })?;
        if !completed {
            return Err(Error::archive(format!("archiving {} was aborted", job.extension_name)));
        }

        for file in &job.generated {
            builder.add_bytes(&file.archive_entry_name, &file.contents)?;
        }

        let output = builder.close()?;
        job.diagnostics
            .warnings
            .extend(output.diagnostics.warnings.iter().cloned());
        job.state = PipelineState::Archived;
        Ok(output)
    }

    /// Replace the install script with freshly exported table definitions
    /// and add sample data and uninstall scripts beside it. Sub-extensions
    /// are exported the same way.
    fn export_database(&self, resolver: &FileSetResolver<'_>, job: &mut PackageJob) -> Result<()> {
        for child in job.children.iter_mut() {
            self.export_database(resolver, child)?;
        }

        let location = Some(job.manifest.file_name().to_string());
        resolver.resolve_sql(job)?;
        if job.install_sql.is_empty() {
            job.diagnostics.add_warning(
                "the manifest has no 'install/sql/file' section; nothing to export",
                location,
            );
            return Ok(());
        }
        if job.uninstall_sql.is_empty() {
            job.diagnostics
                .add_warning("the manifest has an install but no 'uninstall/sql/file' section", location.clone());
        }
        if job.sql_marked_no_data() {
            job.diagnostics
                .add_message(format!("{}: install SQL is marked __no_data__, export skipped", job.extension_name));
            return Ok(());
        }

        let tables = job.install_tables();
        let install_source = job.install_sql[0].source_path.clone();
        if tables.is_empty() {
            job.diagnostics
                .add_warning(format!("no CREATE TABLE statements in {}", install_source), location);
            return Ok(());
        }
        let Some(exporter) = self.exporter else {
            job.diagnostics.add_warning(
                "database export requested but no database exporter is configured",
                location,
            );
            return Ok(());
        };

        let statements = exporter.export(self.installation, &tables)?;
        let install_entry = match job.entries.find_by_source(&install_source) {
            Some(entry) => entry.archive_entry_name.clone(),
            None => install_source
                .strip_prefix(job.manifest.directory())
                .unwrap_or(&install_source)
                .trim_start_matches('/')
                .to_string(),
        };
        for file in generated_files(&install_entry, &statements) {
            job.entries.remove_destination(&file.archive_entry_name);
            job.generated.push(file);
        }
        job.diagnostics.add_message(format!(
            "{}: exported {} table(s) into {}",
            job.extension_name,
            tables.len(),
            install_entry
        ));
        job.state = PipelineState::DatabaseExported;
        Ok(())
    }
}

fn fail(job: PackageJob, errors: Vec<Error>) -> PipelineFailure {
    tracing::error!(
        extension = %job.extension_name,
        reached = %job.state,
        errors = errors.len(),
        "packaging failed"
    );
    PipelineFailure::new(job.state, errors)
        .with_extension(job.extension_name)
        .with_diagnostics(job.diagnostics)
}
