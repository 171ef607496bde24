//! Sub-extensions bundled by a package manifest

use super::FileSetResolver;
use crate::error::{Error, Result};
use crate::models::{client_scope, ExtensionType, LocaleScope, PackageFileEntry, PackageJob};
use crate::utils::helpers::file_stem;

/// A `<file type=".." id="..">` of a package, located in the installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubExtension {
    pub extension_type: ExtensionType,
    pub element: String,
    pub client: Option<LocaleScope>,
    pub manifest_path: String,
}

impl<'a> FileSetResolver<'a> {
    /// Find the installed manifest behind one package `<file>` entry
    pub fn locate_sub_extension(&self, manifest_file: &str, entry: &PackageFileEntry) -> Result<SubExtension> {
        if entry.kind.is_empty() {
            return Err(Error::manifest(
                manifest_file,
                format!("missing 'type' attribute for '{}'", entry.file),
            ));
        }
        let extension_type = ExtensionType::parse(&entry.kind)?;
        if extension_type == ExtensionType::Package {
            return Err(Error::unsupported_type(format!("{} (nested)", entry.kind)));
        }

        let element = match file_stem(entry.file.trim()) {
            "" => entry.id.trim().to_string(),
            stem => stem.to_string(),
        };
        if element.is_empty() {
            return Err(Error::manifest(manifest_file, "package file entry has no name"));
        }

        let client = client_scope(&entry.client);
        let manifest_path = self
            .installation
            .locate_manifest(self.backend, extension_type, &element, client)?;
        Ok(SubExtension {
            extension_type,
            element,
            client,
            manifest_path,
        })
    }

    /// Resolve every sub-extension of a package. Failures are collected
    /// across entries so one run reports every missing extension.
    pub(super) fn resolve_package_files(&self, job: &mut PackageJob) -> std::result::Result<(), Vec<Error>> {
        let manifest_file = job.manifest.file_name().to_string();
        let entries = job.manifest.package_files().unwrap_or_default();
        if entries.is_empty() {
            return Err(vec![Error::manifest(
                &manifest_file,
                "'files' section of the package declares no extensions",
            )]);
        }

        let mut errors = Vec::new();
        for entry in &entries {
            if let Err(e) = self.item_checkpoint(&mut job.progress, "files") {
                errors.push(e);
                break;
            }
            let sub = match self.locate_sub_extension(&manifest_file, entry) {
                Ok(sub) => sub,
                Err(e) => {
                    tracing::warn!(file = %entry.file, error = %e, "sub-extension not resolved");
                    errors.push(e);
                    continue;
                }
            };
            tracing::info!(element = %sub.element, kind = %sub.extension_type, "resolving sub-extension");
            match self.prepare(&sub.manifest_path) {
                Ok(child) => {
                    job.progress.add_items(child.entries.len());
                    job.children.push(child);
                }
                Err(child_errors) => errors.extend(child_errors),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
