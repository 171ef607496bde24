//! files, administration, media and scriptfile sections

use super::FileSetResolver;
use crate::error::{Error, Result};
use crate::models::{
    ExtensionManifest, ExtensionType, FileDeclaration, FilesSection, Installation, LocaleScope, PackageJob,
};
use crate::utils::helpers::join_path;

/// Which client tree a `files` section with this `folder` attribute lives in.
///
/// `folder` empty or `site` means the site tree; anything else is the
/// administrator tree. Modules follow the root `client` attribute instead.
pub fn files_scope(manifest: &ExtensionManifest, folder: &str) -> LocaleScope {
    let admin_client = matches!(
        manifest.attribute("client").map(|c| c.trim().to_lowercase()).as_deref(),
        Some("administrator") | Some("admin")
    );
    match manifest.extension_type {
        ExtensionType::Module if admin_client => LocaleScope::Admin,
        ExtensionType::Module => LocaleScope::Site,
        _ if folder.is_empty() || folder.eq_ignore_ascii_case("site") => LocaleScope::Site,
        _ => LocaleScope::Admin,
    }
}

/// Installation directory an extension's `files` section is read from
pub fn files_source_dir(
    installation: &Installation,
    manifest: &ExtensionManifest,
    extension_name: &str,
    folder: &str,
) -> String {
    installation.path(&[
        files_scope(manifest, folder).client_dir(),
        manifest.extension_type.folder(),
        extension_name,
    ])
}

impl<'a> FileSetResolver<'a> {
    pub fn files_source_dir(&self, job: &PackageJob, folder: &str) -> String {
        files_source_dir(self.installation, &job.manifest, &job.extension_name, folder)
    }

    pub(super) fn resolve_files(&self, job: &mut PackageJob) -> Result<()> {
        let section = job
            .manifest
            .files_section()
            .ok_or_else(|| Error::MissingSections { names: vec!["files".to_string()] })?;
        self.resolve_files_section(job, &section, "files")
    }

    fn resolve_files_section(&self, job: &mut PackageJob, section: &FilesSection, name: &str) -> Result<()> {
        let source_dir = self.files_source_dir(job, &section.folder);
        for declaration in &section.declarations {
            self.item_checkpoint(&mut job.progress, name)?;
            match declaration {
                FileDeclaration::ExplicitFile { relative_path } => {
                    let source = join_path(&[&source_dir, relative_path]);
                    let dest = join_path(&[&section.folder, relative_path]);
                    self.add_declared(job, &source, &dest)?;
                }
                FileDeclaration::FolderInclusion { relative_folder } => {
                    let source = join_path(&[&source_dir, relative_folder]);
                    let dest = join_path(&[&section.folder, relative_folder]);
                    self.add_folder(job, &source, &dest)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub(super) fn resolve_administration(&self, job: &mut PackageJob) -> Result<()> {
        let file = job.manifest.file_name().to_string();
        let section = job
            .manifest
            .administration()
            .ok_or_else(|| Error::MissingSections { names: vec!["administration".to_string()] })?;

        let files = section
            .files
            .ok_or_else(|| Error::manifest(&file, "'administration' section has no 'files'"))?;
        self.resolve_files_section(job, &files, "administration")?;

        match section.languages {
            Some(languages) => self.resolve_languages(job, &languages),
            None => {
                job.diagnostics.add_warning(
                    "'languages' section is missing from the administration section",
                    Some(file),
                );
                Ok(())
            }
        }
    }

    /// `<media folder="media" destination="com_x">`: read from
    /// `{webRoot}/{folder}/{destination}`, archive under `{folder}/`.
    pub(super) fn resolve_media(&self, job: &mut PackageJob) -> Result<()> {
        let Some(section) = job.manifest.media_section() else {
            return Ok(());
        };
        let folder = if section.folder.is_empty() { "media" } else { section.folder.as_str() };
        let target = if section.destination.is_empty() {
            job.extension_name.clone()
        } else {
            section.destination.clone()
        };
        let source_dir = self.installation.path(&[folder, &target]);

        for declaration in &section.declarations {
            self.item_checkpoint(&mut job.progress, "media")?;
            if let FileDeclaration::MediaResource { relative_path, is_folder } = declaration {
                let source = join_path(&[&source_dir, relative_path]);
                let dest = join_path(&[folder, relative_path]);
                if *is_folder {
                    self.add_folder(job, &source, &dest)?;
                } else {
                    self.add_declared(job, &source, &dest)?;
                }
            }
        }
        Ok(())
    }

    /// `<scriptfile>` sits next to the manifest (packages may keep it in a
    /// folder named after the package)
    pub(super) fn resolve_scriptfile(&self, job: &mut PackageJob) -> Result<()> {
        let Some(script) = job.manifest.scriptfile() else {
            return Ok(());
        };
        let directory = job.manifest.directory().to_string();
        let candidates = [
            join_path(&[&directory, &script]),
            join_path(&[&directory, &job.extension_name, &script]),
        ];
        let source = candidates
            .iter()
            .find(|path| self.backend.is_file(path))
            .ok_or_else(|| Error::not_found(candidates[0].clone()))?
            .clone();
        job.add_file(source, script);
        Ok(())
    }
}
