//! `<languages>` sections

use super::FileSetResolver;
use crate::error::{Error, Result};
use crate::models::{LanguagesSection, LocaleScope, PackageJob};
use crate::utils::helpers::{basename, infer_locale, join_path, DEFAULT_LOCALE};

/// Scope of a languages section: its `folder` attribute, else the first
/// path segment of its first file. Must come out as `admin` or `site`.
pub fn section_scope(section: &LanguagesSection) -> Result<(LocaleScope, String)> {
    let folder = section.folder.trim().to_lowercase();
    let folder = if folder.is_empty() {
        section
            .resources()
            .map(|r| r.relative_file.trim())
            .find(|f| !f.is_empty())
            .and_then(|f| f.replace('\\', "/").split('/').next().map(str::to_lowercase))
            .unwrap_or_default()
    } else {
        folder
    };
    if folder.is_empty() {
        return Err(Error::unsupported_scope("(none)"));
    }
    Ok((LocaleScope::parse(&folder)?, folder))
}

impl<'a> FileSetResolver<'a> {
    pub(super) fn resolve_root_languages(&self, job: &mut PackageJob) -> Result<()> {
        match job.manifest.languages_section() {
            Some(section) => self.resolve_languages(job, &section),
            None => Ok(()),
        }
    }

    /// Each language file is read from
    /// `{webRoot}/{client}/language/{locale}/{basename}` and archived under
    /// `{scope}/{declared path}`.
    pub(super) fn resolve_languages(&self, job: &mut PackageJob, section: &LanguagesSection) -> Result<()> {
        let manifest_file = job.manifest.file_name().to_string();
        if section.resources().next().is_none() {
            job.diagnostics
                .add_warning("'languages' section declares no files", Some(manifest_file));
            return Ok(());
        }
        let (scope, folder) = section_scope(section)?;

        for resource in section.resources() {
            self.item_checkpoint(&mut job.progress, "languages")?;

            let file = resource.relative_file.trim();
            if file.is_empty() {
                return Err(Error::manifest(
                    &manifest_file,
                    format!("empty language entry in the '{}' languages section", folder),
                ));
            }

            let locale = match &resource.locale {
                Some(tag) => tag.clone(),
                None => {
                    job.diagnostics.add_warning(
                        format!("missing 'tag' language attribute for {}", file),
                        Some(manifest_file.clone()),
                    );
                    infer_locale(file).unwrap_or_else(|| DEFAULT_LOCALE.to_string())
                }
            };

            let source = self
                .installation
                .path(&[scope.client_dir(), "language", &locale, basename(file)]);
            if !self.backend.is_file(&source) {
                return Err(Error::not_found(source));
            }
            job.add_file(source, join_path(&[&folder, file]));
            job.progress.add_items(1);
        }
        Ok(())
    }
}
