//! Install/uninstall SQL declarations and the tables they touch

use super::FileSetResolver;
use crate::error::{Error, Result};
use crate::models::{PackageJob, SqlPhase, SqlTableSet};
use crate::parser::sql::{scan_install_script, scan_uninstall_script};
use crate::utils::helpers::join_path;

impl<'a> FileSetResolver<'a> {
    /// Scan every declared install and uninstall script. Paths are relative
    /// to the manifest directory.
    pub fn resolve_sql(&self, job: &mut PackageJob) -> Result<()> {
        let directory = job.manifest.directory().to_string();
        for phase in [SqlPhase::Install, SqlPhase::Uninstall] {
            let Some(section) = job.manifest.sql_section(phase) else {
                continue;
            };
            for resource in section.resources() {
                let source_path = join_path(&[&directory, &resource.relative_file]);
                if !self.backend.is_file(&source_path) {
                    return Err(Error::not_found(source_path));
                }
                let content = self.backend.read_to_string(&source_path)?;
                let scan = match phase {
                    SqlPhase::Install => scan_install_script(&content),
                    SqlPhase::Uninstall => scan_uninstall_script(&content),
                };
                tracing::debug!(file = %source_path, ?scan, "scanned sql script");
                let set = SqlTableSet { source_path, scan };
                match phase {
                    SqlPhase::Install => job.install_sql.push(set),
                    SqlPhase::Uninstall => job.uninstall_sql.push(set),
                }
            }
        }
        Ok(())
    }
}
