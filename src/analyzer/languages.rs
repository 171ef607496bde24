//! Language constant cross-referencing
//!
//! Declared constants come from the extension's `.ini` language files; usage
//! comes from its code files. Both are grouped by client scope and only
//! compared within the same scope.

use super::code_files::{discover_code_files, CodeFiles};
use crate::error::{Error, Result};
use crate::models::{Diagnostics, ExtensionManifest, ExtensionType, Installation, LocaleScope};
use crate::parser::ini::{parse_ini, IniEntry};
use crate::parser::manifest::read_manifest;
use crate::storage::StorageBackend;
use crate::utils::helpers::{basename, file_extension, infer_locale, DEFAULT_LOCALE};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

pub const DEFAULT_CODE_FILE_TYPES: &[&str] = &["php", "phtml", "xml"];

lazy_static::lazy_static! {
    static ref XML_COMMENT: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref CONSTANT_REFERENCE: Regex = Regex::new(r"(?:COM|MOD)_[A-Z_]+").unwrap();
}

/// One parsed language file
#[derive(Debug, Clone)]
pub struct LanguageFile {
    pub scope: LocaleScope,
    pub locale: String,
    pub path: String,
    pub entries: Vec<IniEntry>,
}

impl LanguageFile {
    pub fn keys(&self) -> Vec<String> {
        crate::parser::ini::declared_keys(&self.entries)
    }
}

/// Constants a language file declares that no code file uses
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnusedConstants {
    pub scope: LocaleScope,
    pub file: String,
    pub constants: Vec<String>,
}

/// A code reference to a constant no language file of its scope declares
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanedConstant {
    pub scope: LocaleScope,
    pub file: String,
    /// 1-based
    pub line: usize,
    pub constant: String,
}

pub struct LanguageCrossReferencer<'a> {
    backend: &'a dyn StorageBackend,
    installation: &'a Installation,
    file_types: Vec<String>,
    diagnostics: Diagnostics,
}

impl<'a> LanguageCrossReferencer<'a> {
    pub fn new(backend: &'a dyn StorageBackend, installation: &'a Installation) -> Self {
        Self {
            backend,
            installation,
            file_types: DEFAULT_CODE_FILE_TYPES.iter().map(|t| t.to_string()).collect(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// File extensions searched for constant references
    pub fn with_file_types(mut self, file_types: Vec<String>) -> Self {
        self.file_types = file_types;
        self
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Read the installed manifest of `element` (`com_x`, `mod_x`, ...)
    pub fn load_manifest(&self, element: &str) -> Result<ExtensionManifest> {
        let extension_type = ExtensionType::from_element(element).ok_or_else(|| Error::InvalidName {
            file: element.to_string(),
        })?;
        let path = self
            .installation
            .locate_manifest(self.backend, extension_type, element, None)?;
        read_manifest(self.backend, &path)
    }

    /// Parse every language file the manifest declares
    pub fn language_files(&mut self, manifest: &ExtensionManifest) -> Result<Vec<LanguageFile>> {
        let mut files = Vec::new();
        for (scope, resources) in manifest.language_files()? {
            for resource in resources {
                let locale = match &resource.locale {
                    Some(locale) => locale.clone(),
                    None => {
                        self.diagnostics.add_warning(
                            format!("missing 'tag' language attribute for {}", resource.relative_file),
                            Some(manifest.file_name().to_string()),
                        );
                        infer_locale(&resource.relative_file).unwrap_or_else(|| DEFAULT_LOCALE.to_string())
                    }
                };
                let path = self.installation.path(&[
                    scope.client_dir(),
                    "language",
                    &locale,
                    basename(&resource.relative_file),
                ]);
                if !self.backend.is_file(&path) {
                    return Err(Error::not_found(path));
                }
                let content = self.backend.read_to_string(&path)?;
                let entries = parse_ini(&content, &path)?;
                files.push(LanguageFile {
                    scope,
                    locale,
                    path,
                    entries,
                });
            }
        }
        Ok(files)
    }

    pub fn code_files(&self, manifest: &ExtensionManifest) -> Result<CodeFiles> {
        discover_code_files(self.backend, self.installation, manifest, &self.file_types)
    }

    /// Per language file, the declared constants no code file of the same
    /// scope mentions. The extension's own name is never reported.
    pub fn find_unused_constants(&mut self, manifest: &ExtensionManifest) -> Result<Vec<UnusedConstants>> {
        let reserved = manifest.element_name()?.to_uppercase();
        let language_files = self.language_files(manifest)?;
        let code_files = self.code_files(manifest)?;
        let mut contents = ContentCache::new(self.backend);

        let mut results = Vec::new();
        for language_file in &language_files {
            let declared: Vec<String> = language_file
                .keys()
                .into_iter()
                .filter(|key| *key != reserved)
                .collect();
            let scoped = code_files.get(&language_file.scope).cloned().unwrap_or_default();
            if scoped.is_empty() {
                self.diagnostics.add_warning(
                    format!("no {} code files to check against", language_file.scope.as_str()),
                    Some(language_file.path.clone()),
                );
            }
            let mut texts = Vec::with_capacity(scoped.len());
            for file in &scoped {
                texts.push(contents.get(file)?.to_string());
            }
            let constants = unused_constants(&declared, &texts, &language_file.path)?;
            tracing::debug!(file = %language_file.path, unused = constants.len(), "language file checked");
            results.push(UnusedConstants {
                scope: language_file.scope,
                file: language_file.path.clone(),
                constants,
            });
        }
        Ok(results)
    }

    /// Every `COM_*`/`MOD_*` reference in code that no language file of the
    /// same scope declares
    pub fn find_orphaned_constants(&mut self, manifest: &ExtensionManifest) -> Result<Vec<OrphanedConstant>> {
        let reserved = manifest.element_name()?.to_uppercase();
        let language_files = self.language_files(manifest)?;
        let code_files = self.code_files(manifest)?;
        let mut contents = ContentCache::new(self.backend);

        let mut orphaned = Vec::new();
        for (scope, files) in &code_files {
            let mut known: HashSet<String> = language_files
                .iter()
                .filter(|f| f.scope == *scope)
                .flat_map(|f| f.keys())
                .collect();
            if known.is_empty() {
                self.diagnostics.add_warning(
                    format!("no {} language constants declared; skipping its code files", scope.as_str()),
                    Some(manifest.file_name().to_string()),
                );
                continue;
            }
            known.insert(reserved.clone());

            for file in files {
                for (line, constant) in orphaned_references(contents.get(file)?, &known) {
                    orphaned.push(OrphanedConstant {
                        scope: *scope,
                        file: file.clone(),
                        line,
                        constant,
                    });
                }
            }
        }
        Ok(orphaned)
    }
}

/// Code file text, read once per run, with XML comments removed from `.xml` files
struct ContentCache<'a> {
    backend: &'a dyn StorageBackend,
    texts: HashMap<String, String>,
}

impl<'a> ContentCache<'a> {
    fn new(backend: &'a dyn StorageBackend) -> Self {
        Self {
            backend,
            texts: HashMap::new(),
        }
    }

    fn get(&mut self, path: &str) -> Result<&str> {
        if !self.texts.contains_key(path) {
            let text = self.backend.read_to_string(path)?;
            let text = if file_extension(path).as_deref() == Some("xml") {
                strip_xml_comments(&text)
            } else {
                text
            };
            self.texts.insert(path.to_string(), text);
        }
        Ok(self.texts.get(path).map(String::as_str).unwrap_or_default())
    }
}

pub fn strip_xml_comments(text: &str) -> String {
    if text.contains("<!--") {
        XML_COMMENT.replace_all(text, "").into_owned()
    } else {
        text.to_string()
    }
}

/// Constants from `declared` that no text mentions as a whole word, in
/// declaration order
pub fn unused_constants(declared: &[String], texts: &[String], source: &str) -> Result<Vec<String>> {
    if declared.is_empty() {
        return Ok(Vec::new());
    }
    let alternation = declared
        .iter()
        .map(|c| regex::escape(c))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = RegexBuilder::new(&format!(r"\b(?:{})\b", alternation))
        .size_limit(64 << 20)
        .build()
        .map_err(|e| Error::Syntax {
            file: source.to_string(),
            line: 0,
            message: format!("cannot build the constant pattern: {}", e),
        })?;

    let mut remaining: HashSet<&str> = declared.iter().map(String::as_str).collect();
    for text in texts {
        for found in pattern.find_iter(text) {
            remaining.remove(found.as_str());
        }
        if remaining.is_empty() {
            break;
        }
    }
    Ok(declared
        .iter()
        .filter(|c| remaining.contains(c.as_str()))
        .cloned()
        .collect())
}

/// `(line, constant)` for each reference not in `known`; lines are 1-based
pub fn orphaned_references(text: &str, known: &HashSet<String>) -> Vec<(usize, String)> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut found = Vec::new();
    for (index, line) in normalized.lines().enumerate() {
        for m in CONSTANT_REFERENCE.find_iter(line) {
            if !known.contains(m.as_str()) {
                found.push((index + 1, m.as_str().to_string()));
            }
        }
    }
    found
}
