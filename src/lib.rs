//! Joomla extension packager
//!
//! Reads an installed extension's XML manifest from a local or FTP-hosted
//! installation, resolves every file the manifest declares to its place in
//! an installable ZIP, and writes that archive. Packages bundle their
//! sub-extensions as nested archives. Language constants can be
//! cross-referenced against the extension's code.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod models;
pub mod packager;
pub mod parser;
pub mod report;
pub mod resolver;
pub mod storage;
pub mod utils;
pub mod validator;

pub use analyzer::{analyze_languages, LanguageAnalysis, LanguageCrossReferencer};
pub use error::{Error, Result};
pub use models::{
    ExtensionManifest, ExtensionType, Installation, PackageJob, PackageOutcome, PipelineFailure,
    PipelineState,
};
pub use packager::{DbExporter, PackagePipeline};
pub use storage::{LocalBackend, RemoteBackend, StorageBackend};

use std::path::Path;
use std::time::Duration;

/// Main entry point for packaging one installed extension
pub fn package_extension(
    backend: &dyn StorageBackend,
    installation: &Installation,
    manifest_path: &str,
    dest_dir: &Path,
    options: PackageOptions,
) -> std::result::Result<PackageOutcome, PipelineFailure> {
    PackagePipeline::new(backend, installation, options).run(manifest_path, dest_dir)
}

#[derive(Debug, Clone)]
pub struct PackageOptions {
    /// Regenerate install SQL from the live database
    pub export_database: bool,
    /// Remote sessions are re-established after this much work
    pub reconnect_after: Duration,
    /// Keep an existing archive as `{name}_NNNN.zip` instead of failing
    pub rename_existing: bool,
    /// Extensions of files searched for language constants
    pub code_file_types: Vec<String>,
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self {
            export_database: false,
            reconnect_after: storage::DEFAULT_RECONNECT_AFTER,
            rename_existing: false,
            code_file_types: analyzer::DEFAULT_CODE_FILE_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}
