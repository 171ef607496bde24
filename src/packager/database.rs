//! Database export hook
//!
//! Exporting table definitions and rows needs a live database connection,
//! which this crate does not own. Callers plug in a [`DbExporter`]; the
//! pipeline turns its statements into SQL files inside the archive.

use crate::error::Result;
use crate::models::{GeneratedFile, Installation};
use crate::utils::helpers::{dirname, join_path};

pub const STATEMENT_SEPARATOR: &str = "\n\t\t\t\t\n";
pub const SAMPLE_DATA_FILE: &str = "sampledata.mysql.utf8.sql";
pub const UNINSTALL_FILE: &str = "uninstall.mysql.utf8.sql";

/// Statements for a set of tables, in table order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportedStatements {
    pub drop: Vec<String>,
    pub create: Vec<String>,
    pub insert: Vec<String>,
}

pub trait DbExporter {
    fn export(&self, installation: &Installation, tables: &[String]) -> Result<ExportedStatements>;
}

/// Files written for an export: the create statements replace the install
/// script, rows and drops go next to it.
pub fn generated_files(install_entry_name: &str, statements: &ExportedStatements) -> Vec<GeneratedFile> {
    let folder = match dirname(install_entry_name) {
        "/" => "",
        dir => dir,
    };
    let file = |name: String, statements: &[String]| GeneratedFile {
        archive_entry_name: name,
        contents: statements.join(STATEMENT_SEPARATOR).into_bytes(),
    };
    vec![
        file(install_entry_name.to_string(), &statements.create),
        file(join_path(&[folder, SAMPLE_DATA_FILE]), &statements.insert),
        file(join_path(&[folder, UNINSTALL_FILE]), &statements.drop),
    ]
}
