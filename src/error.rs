//! Error types for extpack

use std::io;
use thiserror::Error;

/// Result type alias using extpack's Error type
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem or transport read/write failure
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Not found: {path}")]
    NotFound { path: String },

    /// Remote session could not be established or was lost
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// Malformed XML or missing root `type` attribute
    #[error("Invalid manifest {file}: {message}")]
    Manifest { file: String, message: String },

    /// Every required element absent from the manifest, in declaration order
    #[error("Required element(s) missing: {}", .names.join(", "))]
    MissingSections { names: Vec<String> },

    #[error("Unsupported extension type: {kind}")]
    UnsupportedType { kind: String },

    #[error("Unsupported language folder scope: {scope}")]
    UnsupportedScope { scope: String },

    /// A package references a sub-extension that is not installed
    #[error("Extension {name} is not installed (expected manifest at {manifest})")]
    MissingExtension { name: String, manifest: String },

    #[error("Cannot derive an extension name from {file}")]
    InvalidName { file: String },

    #[error("Archive error: {message}")]
    Archive { message: String },

    /// Localization file line that is neither blank, a comment nor KEY="value"
    #[error("Syntax error in {file} on line {line}: {message}")]
    Syntax {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl Error {
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn manifest(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Manifest {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn unsupported_type(kind: impl Into<String>) -> Self {
        Self::UnsupportedType { kind: kind.into() }
    }

    pub fn unsupported_scope(scope: impl Into<String>) -> Self {
        Self::UnsupportedScope {
            scope: scope.into(),
        }
    }

    /// True for a sub-extension that is referenced but not installed, so
    /// callers can print installation advice instead of a generic failure.
    pub fn is_missing_extension(&self) -> bool {
        matches!(self, Self::MissingExtension { .. })
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Self::archive(err.to_string())
    }
}
