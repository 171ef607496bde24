//! Parsing modules for manifests, language files and SQL scripts

pub mod ini;
pub mod manifest;
pub mod sql;
pub mod xml;

pub use ini::{parse_ini, IniEntry};
pub use manifest::{check_requirements, parse_manifest, parse_validated_manifest, read_manifest};
pub use xml::{extract_attributes, parse_document, Element, Node};
