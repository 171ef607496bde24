//! Manifest section content: what an extension declares, before resolution

use crate::error::{Error, Result};
use serde::Serialize;

/// Where a language bundle lives in an installation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum LocaleScope {
    Admin,
    Site,
}

impl LocaleScope {
    /// Accepts exactly `admin` or `site` (case-insensitive, surrounding blanks ignored)
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "site" => Ok(Self::Site),
            other => Err(Error::unsupported_scope(other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Site => "site",
        }
    }

    /// Installation subdirectory holding this scope's files
    pub fn client_dir(&self) -> &'static str {
        match self {
            Self::Admin => "administrator",
            Self::Site => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SqlPhase {
    Install,
    Uninstall,
}

impl SqlPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Uninstall => "uninstall",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageResource {
    /// `tag` attribute; `None` when the manifest omits it
    pub locale: Option<String>,
    pub relative_file: String,
    /// `folder` attribute of the enclosing `<languages>` element, if any
    pub folder_scope: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlResource {
    pub relative_file: String,
    pub phase: SqlPhase,
    pub driver: Option<String>,
    pub charset: Option<String>,
}

/// One unit of a manifest section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FileDeclaration {
    ExplicitFile { relative_path: String },
    FolderInclusion { relative_folder: String },
    LanguageResource(LanguageResource),
    MediaResource { relative_path: String, is_folder: bool },
    SqlResource(SqlResource),
}

/// `<files>` (or `<administration><files>`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilesSection {
    pub folder: String,
    pub declarations: Vec<FileDeclaration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguagesSection {
    pub folder: String,
    pub declarations: Vec<FileDeclaration>,
}

impl LanguagesSection {
    pub fn resources(&self) -> impl Iterator<Item = &LanguageResource> {
        self.declarations.iter().filter_map(|d| match d {
            FileDeclaration::LanguageResource(resource) => Some(resource),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaSection {
    pub folder: String,
    pub destination: String,
    pub declarations: Vec<FileDeclaration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdministrationSection {
    pub files: Option<FilesSection>,
    pub languages: Option<LanguagesSection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlSection {
    pub phase: SqlPhase,
    pub declarations: Vec<FileDeclaration>,
}

impl SqlSection {
    pub fn resources(&self) -> impl Iterator<Item = &SqlResource> {
        self.declarations.iter().filter_map(|d| match d {
            FileDeclaration::SqlResource(resource) => Some(resource),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateServer {
    pub kind: String,
    pub priority: Option<u32>,
    pub name: String,
    pub url: String,
}

/// `<file type=".." id=".." client="..">mod_x.zip</file>` inside a package manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageFileEntry {
    pub kind: String,
    pub id: String,
    pub client: String,
    pub file: String,
}

/// Section names the packager knows how to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SectionKind {
    Files,
    Administration,
    Languages,
    Media,
    Install,
    Uninstall,
    Scriptfile,
    UpdateServers,
}

impl SectionKind {
    pub const ALL: [SectionKind; 8] = [
        Self::Files,
        Self::Administration,
        Self::Languages,
        Self::Media,
        Self::Install,
        Self::Uninstall,
        Self::Scriptfile,
        Self::UpdateServers,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Files => "files",
            Self::Administration => "administration",
            Self::Languages => "languages",
            Self::Media => "media",
            Self::Install => "install",
            Self::Uninstall => "uninstall",
            Self::Scriptfile => "scriptfile",
            Self::UpdateServers => "updateservers",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// Typed content of one manifest section
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSection {
    Files(FilesSection),
    PackageFiles(Vec<PackageFileEntry>),
    Administration(AdministrationSection),
    Languages(LanguagesSection),
    Media(MediaSection),
    Sql(SqlSection),
    Scriptfile(String),
    UpdateServers(Vec<UpdateServer>),
}
