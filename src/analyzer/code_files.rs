//! Code files that may reference language constants, grouped by client scope

use crate::error::Result;
use crate::models::{ExtensionManifest, FileDeclaration, Installation, LocaleScope};
use crate::resolver::sections::{files_scope, files_source_dir};
use crate::resolver::FileSetResolver;
use crate::storage::{collect_files, StorageBackend};
use crate::utils::helpers::{file_extension, join_path, strip_type_prefix};
use std::collections::BTreeMap;

pub type CodeFiles = BTreeMap<LocaleScope, Vec<String>>;

/// Collect code files for an installed extension.
///
/// Admin scope gets the manifest itself, the scriptfile, the component's
/// plugin folder and `administration/files`; `files` goes to whichever scope
/// its `folder` attribute names. Only files whose extension is in
/// `file_types` are kept; the manifest is always kept.
pub fn discover_code_files(
    backend: &dyn StorageBackend,
    installation: &Installation,
    manifest: &ExtensionManifest,
    file_types: &[String],
) -> Result<CodeFiles> {
    let element = manifest.element_name()?;
    let resolver = FileSetResolver::new(backend, installation);
    let mut found: Vec<(LocaleScope, String)> = vec![(LocaleScope::Admin, manifest.source_path.clone())];

    if let Some(script) = manifest.scriptfile() {
        let path = join_path(&[manifest.directory(), &script]);
        if backend.is_file(&path) {
            found.push((LocaleScope::Admin, path));
        }
    }

    let plugin_dir = installation.path(&[
        "plugins",
        &strip_type_prefix(&element, manifest.extension_type.prefix()),
    ]);
    if backend.is_dir(&plugin_dir) {
        for path in collect_files(backend, &plugin_dir)? {
            found.push((LocaleScope::Admin, path));
        }
    }

    let mut sections = Vec::new();
    if let Some(files) = manifest.files_section() {
        sections.push((files_scope(manifest, &files.folder), files));
    }
    if let Some(files) = manifest.administration().and_then(|a| a.files) {
        sections.push((LocaleScope::Admin, files));
    }
    for (scope, section) in sections {
        let source_dir = files_source_dir(installation, manifest, &element, &section.folder);
        for declaration in &section.declarations {
            let relative = match declaration {
                FileDeclaration::ExplicitFile { relative_path } => relative_path,
                FileDeclaration::FolderInclusion { relative_folder } => relative_folder,
                _ => continue,
            };
            let path = join_path(&[&source_dir, relative]);
            if backend.is_file(&path) {
                found.push((scope, path));
            } else if backend.is_dir(&path) {
                for entry in resolver.expand_folder(&path, relative)? {
                    found.push((scope, entry.source_path));
                }
            } else {
                tracing::debug!(path = %path, "declared code path not found");
            }
        }
    }

    let mut code_files = CodeFiles::new();
    for (scope, path) in found {
        let keep = path == manifest.source_path
            || file_extension(&path)
                .map(|ext| file_types.iter().any(|t| t.eq_ignore_ascii_case(&ext)))
                .unwrap_or(false);
        let list = code_files.entry(scope).or_default();
        if keep && !list.contains(&path) {
            list.push(path);
        }
    }
    Ok(code_files)
}
