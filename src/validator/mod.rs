//! Validation module

pub mod structure;

use crate::error::Error;
use crate::models::PackageJob;
use crate::storage::StorageBackend;

/// Check a resolved job before it is archived, children included
pub fn validate_job(job: &PackageJob, backend: &dyn StorageBackend) -> Result<(), Vec<Error>> {
    let mut problems = structure::validate_structure(job, backend);
    for child in &job.children {
        if let Err(child_problems) = validate_job(child, backend) {
            problems.extend(child_problems);
        }
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}
