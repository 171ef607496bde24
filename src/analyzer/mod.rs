//! Analysis of installed extensions: language constants and template drift

pub mod code_files;
pub mod languages;
pub mod template;

pub use code_files::{discover_code_files, CodeFiles};
pub use languages::{
    LanguageCrossReferencer, LanguageFile, OrphanedConstant, UnusedConstants, DEFAULT_CODE_FILE_TYPES,
};
pub use template::{compare_with_template, TemplateComparison};

use crate::error::Result;
use crate::models::{Diagnostics, Installation};
use crate::storage::StorageBackend;
use serde::Serialize;

/// Both cross-reference results for one extension
#[derive(Debug, Clone, Serialize)]
pub struct LanguageAnalysis {
    pub extension_name: String,
    pub unused: Vec<UnusedConstants>,
    pub orphaned: Vec<OrphanedConstant>,
    pub diagnostics: Diagnostics,
}

/// Find unused and orphaned constants of an installed extension
pub fn analyze_languages(
    backend: &dyn StorageBackend,
    installation: &Installation,
    element: &str,
    file_types: Vec<String>,
) -> Result<LanguageAnalysis> {
    let mut referencer = LanguageCrossReferencer::new(backend, installation).with_file_types(file_types);
    let manifest = referencer.load_manifest(element)?;
    let unused = referencer.find_unused_constants(&manifest)?;
    let orphaned = referencer.find_orphaned_constants(&manifest)?;
    Ok(LanguageAnalysis {
        extension_name: manifest.element_name()?,
        unused,
        orphaned,
        diagnostics: referencer.diagnostics().clone(),
    })
}
