//! Extension manifest structures

use super::declaration::*;
use crate::error::{Error, Result};
use crate::parser::xml::{extract_attributes, Element, Node};
use crate::utils::{self, helpers};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ExtensionType {
    Component,
    Module,
    Package,
}

/// A section the pipeline resolves, and whether its absence is fatal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionRule {
    pub kind: SectionKind,
    pub required: bool,
}

const fn rule(kind: SectionKind, required: bool) -> SectionRule {
    SectionRule { kind, required }
}

const COMPONENT_REQUIRED: &[&str] = &[
    "name",
    "creationDate",
    "author",
    "authorEmail",
    "authorUrl",
    "copyright",
    "license",
    "version",
    "description",
    "files",
    "administration",
    "media",
    "languages",
];
const COMPONENT_OPTIONAL: &[&str] = &["scriptfile", "install", "uninstall", "update"];

const MODULE_REQUIRED: &[&str] = &[
    "name",
    "author",
    "creationDate",
    "copyright",
    "license",
    "authorEmail",
    "authorUrl",
    "version",
    "description",
    "files",
];
const MODULE_OPTIONAL: &[&str] = &["install", "uninstall", "update"];

const PACKAGE_REQUIRED: &[&str] = &[
    "author",
    "authorEmail",
    "authorUrl",
    "copyright",
    "creationDate",
    "description",
    "files",
    "license",
    "name",
    "packagename",
    "version",
];
const PACKAGE_OPTIONAL: &[&str] = &["packager", "packagerurl", "scriptfile", "updateservers", "url"];

const COMPONENT_PLAN: &[SectionRule] = &[
    rule(SectionKind::Files, true),
    rule(SectionKind::Administration, true),
    rule(SectionKind::Languages, true),
    rule(SectionKind::Scriptfile, false),
    rule(SectionKind::Media, true),
];
const MODULE_PLAN: &[SectionRule] = &[
    rule(SectionKind::Files, true),
    rule(SectionKind::Languages, false),
    rule(SectionKind::Media, false),
];
const PACKAGE_PLAN: &[SectionRule] = &[
    rule(SectionKind::Files, true),
    rule(SectionKind::Languages, false),
    rule(SectionKind::Scriptfile, false),
];

impl ExtensionType {
    pub fn parse(kind: &str) -> Result<Self> {
        match kind.trim().to_lowercase().as_str() {
            "component" => Ok(Self::Component),
            "module" => Ok(Self::Module),
            "package" => Ok(Self::Package),
            other => Err(Error::unsupported_type(other)),
        }
    }

    /// Type named by an element's prefix (`com_x`, `mod_x`, `pkg_x`)
    pub fn from_element(element: &str) -> Option<Self> {
        let lower = element.trim().to_lowercase();
        [Self::Component, Self::Module, Self::Package]
            .into_iter()
            .find(|kind| lower.starts_with(kind.prefix()) && lower.len() > kind.prefix().len())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Module => "module",
            Self::Package => "package",
        }
    }

    /// Element-name prefix: `com_`, `mod_`, `pkg_`
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Component => "com_",
            Self::Module => "mod_",
            Self::Package => "pkg_",
        }
    }

    /// Installation folder holding extensions of this type
    pub fn folder(&self) -> &'static str {
        match self {
            Self::Component => "components",
            Self::Module => "modules",
            Self::Package => "packages",
        }
    }

    pub fn required_elements(&self) -> &'static [&'static str] {
        match self {
            Self::Component => COMPONENT_REQUIRED,
            Self::Module => MODULE_REQUIRED,
            Self::Package => PACKAGE_REQUIRED,
        }
    }

    pub fn optional_elements(&self) -> &'static [&'static str] {
        match self {
            Self::Component => COMPONENT_OPTIONAL,
            Self::Module => MODULE_OPTIONAL,
            Self::Package => PACKAGE_OPTIONAL,
        }
    }

    /// Sections resolved into archive entries for this type
    pub fn section_plan(&self) -> &'static [SectionRule] {
        match self {
            Self::Component => COMPONENT_PLAN,
            Self::Module => MODULE_PLAN,
            Self::Package => PACKAGE_PLAN,
        }
    }
}

impl fmt::Display for ExtensionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed extension descriptor. Immutable once built.
#[derive(Debug, Clone)]
pub struct ExtensionManifest {
    pub extension_type: ExtensionType,
    /// Root-tag attributes (type, version, method, client, ...)
    pub attributes: BTreeMap<String, String>,
    pub root: Element,
    /// Where the manifest was read from, forward-slash separated
    pub source_path: String,
}

impl ExtensionManifest {
    pub fn file_name(&self) -> &str {
        helpers::basename(&self.source_path)
    }

    /// Directory containing the manifest
    pub fn directory(&self) -> &str {
        helpers::dirname(&self.source_path)
    }

    /// Canonical element name derived from the manifest file name
    /// (`helloworld.xml` of a component becomes `com_helloworld`).
    pub fn element_name(&self) -> Result<String> {
        let stem = helpers::file_stem(&self.source_path);
        let prefix = self.extension_type.prefix();
        let name = helpers::strip_type_prefix(stem, prefix);
        if name.is_empty() {
            return Err(Error::InvalidName {
                file: self.file_name().to_string(),
            });
        }
        Ok(format!("{}{}", prefix, name))
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_element(&self, name: &str) -> bool {
        self.root.has_child(name)
    }

    /// Trimmed text of a top-level metadata element
    pub fn text(&self, name: &str) -> Option<&str> {
        self.root.child_text(name)
    }

    pub fn name(&self) -> &str {
        self.text("name").unwrap_or_default()
    }

    pub fn version(&self) -> &str {
        self.text("version")
            .or_else(|| self.attribute("version"))
            .unwrap_or_default()
    }

    /// Names from `required` that the manifest lacks, in the given order
    pub fn missing_elements(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.has_element(name))
            .map(|name| name.to_string())
            .collect()
    }

    /// Recognized sections in document order
    pub fn section_order(&self) -> Vec<SectionKind> {
        let mut kinds = Vec::new();
        for (name, _) in self.root.iter_children() {
            if let Some(kind) = SectionKind::from_name(name) {
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
        }
        kinds
    }

    pub fn section(&self, kind: SectionKind) -> Option<ManifestSection> {
        match kind {
            SectionKind::Files if self.extension_type == ExtensionType::Package => {
                self.package_files().map(ManifestSection::PackageFiles)
            }
            SectionKind::Files => self.files_section().map(ManifestSection::Files),
            SectionKind::Administration => self.administration().map(ManifestSection::Administration),
            SectionKind::Languages => self.languages_section().map(ManifestSection::Languages),
            SectionKind::Media => self.media_section().map(ManifestSection::Media),
            SectionKind::Install => self.sql_section(SqlPhase::Install).map(ManifestSection::Sql),
            SectionKind::Uninstall => self.sql_section(SqlPhase::Uninstall).map(ManifestSection::Sql),
            SectionKind::Scriptfile => self.scriptfile().map(ManifestSection::Scriptfile),
            SectionKind::UpdateServers => self.update_servers().map(ManifestSection::UpdateServers),
        }
    }

    /// Every recognized section, typed, in document order
    pub fn sections(&self) -> Vec<(SectionKind, ManifestSection)> {
        self.section_order()
            .into_iter()
            .filter_map(|kind| self.section(kind).map(|section| (kind, section)))
            .collect()
    }

    pub fn files_section(&self) -> Option<FilesSection> {
        self.root.child("files").map(read_files)
    }

    pub fn administration(&self) -> Option<AdministrationSection> {
        self.root.child("administration").map(|node| AdministrationSection {
            files: node.child("files").map(read_files),
            languages: node.child("languages").map(read_languages),
        })
    }

    pub fn languages_section(&self) -> Option<LanguagesSection> {
        self.root.child("languages").map(read_languages)
    }

    pub fn media_section(&self) -> Option<MediaSection> {
        self.root.child("media").map(|node| {
            let attrs = extract_attributes(node, &[("folder", ""), ("destination", "")]);
            let declarations = node
                .iter_children()
                .into_iter()
                .filter_map(|(name, child)| {
                    let path = child.text();
                    match name {
                        "filename" if !path.is_empty() => Some(FileDeclaration::MediaResource {
                            relative_path: path.to_string(),
                            is_folder: false,
                        }),
                        "folder" if !path.is_empty() => Some(FileDeclaration::MediaResource {
                            relative_path: path.to_string(),
                            is_folder: true,
                        }),
                        _ => None,
                    }
                })
                .collect();
            MediaSection {
                folder: attrs["folder"].trim().to_string(),
                destination: attrs["destination"].trim().to_string(),
                declarations,
            }
        })
    }

    /// `<install><sql><file driver=".." charset="..">path</file></sql></install>`
    pub fn sql_section(&self, phase: SqlPhase) -> Option<SqlSection> {
        let node = self.root.child(phase.as_str())?;
        let declarations = node
            .children_named("sql")
            .iter()
            .flat_map(|sql| sql.children_named("file"))
            .filter(|file| !file.text().is_empty())
            .map(|file| {
                let attrs = extract_attributes(file, &[]);
                FileDeclaration::SqlResource(SqlResource {
                    relative_file: file.text().to_string(),
                    phase,
                    driver: attrs.get("driver").cloned(),
                    charset: attrs.get("charset").cloned(),
                })
            })
            .collect();
        Some(SqlSection { phase, declarations })
    }

    pub fn scriptfile(&self) -> Option<String> {
        self.text("scriptfile")
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn update_servers(&self) -> Option<Vec<UpdateServer>> {
        let node = self.root.child("updateservers")?;
        Some(
            node.children_named("server")
                .iter()
                .map(|server| {
                    let attrs = extract_attributes(server, &[("type", ""), ("name", "")]);
                    UpdateServer {
                        kind: attrs["type"].clone(),
                        priority: attrs.get("priority").and_then(|p| p.trim().parse().ok()),
                        name: attrs["name"].clone(),
                        url: server.text().to_string(),
                    }
                })
                .collect(),
        )
    }

    /// Sub-extension declarations of a package manifest
    pub fn package_files(&self) -> Option<Vec<PackageFileEntry>> {
        let files = self.root.children_named("files");
        if files.is_empty() {
            return None;
        }
        Some(
            files
                .iter()
                .flat_map(|node| node.children_named("file"))
                .map(|file| {
                    let attrs = extract_attributes(file, &[("type", ""), ("id", ""), ("client", "")]);
                    PackageFileEntry {
                        kind: attrs["type"].trim().to_string(),
                        id: attrs["id"].clone(),
                        client: attrs["client"].clone(),
                        file: file.text().to_string(),
                    }
                })
                .collect(),
        )
    }

    /// Language files grouped by scope: `administration/languages` is admin,
    /// root `languages` is site, and a `folder` attribute overrides either.
    /// Legacy `admin/languages/..` and `site/languages/..` paths are rewritten
    /// to `language/..`.
    pub fn language_files(&self) -> Result<BTreeMap<LocaleScope, Vec<LanguageResource>>> {
        let mut scoped: BTreeMap<LocaleScope, Vec<LanguageResource>> = BTreeMap::new();
        let sources = [
            (LocaleScope::Admin, self.administration().and_then(|a| a.languages)),
            (LocaleScope::Site, self.languages_section()),
        ];
        for (location, section) in sources {
            let Some(section) = section else { continue };
            let scope = if section.folder.trim().is_empty() {
                location
            } else {
                LocaleScope::parse(&section.folder)?
            };
            let resources = section.resources().map(|resource| LanguageResource {
                relative_file: canonical_language_path(&resource.relative_file),
                ..resource.clone()
            });
            scoped.entry(scope).or_default().extend(resources);
        }
        Ok(scoped)
    }

    /// Manifest source with `{{...}}` tokens escaped, for verbatim display
    pub fn escaped_text(&self, name: &str) -> Option<String> {
        self.text(name).map(utils::escape_placeholders)
    }
}

/// Rewrite `admin/languages/..` and `site/languages/..` to `language/..`
pub fn canonical_language_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let lower = normalized.to_lowercase();
    for prefix in ["admin/languages/", "site/languages/"] {
        if lower.len() > prefix.len() && lower.starts_with(prefix) {
            return format!("language/{}", &normalized[prefix.len()..]);
        }
    }
    path.to_string()
}

fn read_files(node: &Node) -> FilesSection {
    let attrs = extract_attributes(node, &[("folder", "")]);
    let declarations = node
        .iter_children()
        .into_iter()
        .filter_map(|(name, child)| {
            let path = child.text();
            if path.is_empty() {
                return None;
            }
            match name {
                "filename" => Some(FileDeclaration::ExplicitFile {
                    relative_path: path.to_string(),
                }),
                "folder" => Some(FileDeclaration::FolderInclusion {
                    relative_folder: path.to_string(),
                }),
                _ => None,
            }
        })
        .collect();
    FilesSection {
        folder: attrs["folder"].trim().to_string(),
        declarations,
    }
}

fn read_languages(node: &Node) -> LanguagesSection {
    let attrs = extract_attributes(node, &[("folder", "")]);
    let folder = attrs["folder"].trim().to_string();
    let folder_scope = (!folder.is_empty()).then(|| folder.clone());
    let declarations = node
        .children_named("language")
        .iter()
        .map(|language| {
            let tag = language.attr("tag").map(str::trim).unwrap_or_default();
            FileDeclaration::LanguageResource(LanguageResource {
                locale: (!tag.is_empty()).then(|| tag.to_string()),
                relative_file: language.text().to_string(),
                folder_scope: folder_scope.clone(),
            })
        })
        .collect();
    LanguagesSection { folder, declarations }
}
