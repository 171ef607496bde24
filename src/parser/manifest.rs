//! Extension manifest parsing

use crate::error::{Error, Result};
use crate::models::{ExtensionManifest, ExtensionType};
use crate::parser::xml::parse_document;
use crate::storage::StorageBackend;

/// Parse manifest XML.
///
/// Fails when the XML is malformed or the root element has no `type`
/// attribute. Required sections are not checked here; see
/// [`check_requirements`].
pub fn parse_manifest(bytes: &[u8], source_path: &str) -> Result<ExtensionManifest> {
    let root = parse_document(bytes, source_path)?;

    let kind = root
        .attributes
        .get("type")
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::manifest(source_path, "root element has no 'type' attribute"))?;
    let extension_type = ExtensionType::parse(kind)?;

    Ok(ExtensionManifest {
        extension_type,
        attributes: root.attributes.clone(),
        root,
        source_path: source_path.replace('\\', "/"),
    })
}

/// Every required element the manifest lacks, reported together
pub fn check_requirements(manifest: &ExtensionManifest) -> Result<()> {
    let missing = manifest.missing_elements(manifest.extension_type.required_elements());
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingSections { names: missing })
    }
}

/// Parse and reject manifests missing required sections
pub fn parse_validated_manifest(bytes: &[u8], source_path: &str) -> Result<ExtensionManifest> {
    let manifest = parse_manifest(bytes, source_path)?;
    check_requirements(&manifest)?;
    Ok(manifest)
}

/// Read and parse a manifest through a storage backend
pub fn read_manifest(backend: &dyn StorageBackend, path: &str) -> Result<ExtensionManifest> {
    let bytes = backend.read_file(path)?;
    parse_manifest(&bytes, path)
}
