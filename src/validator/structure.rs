//! Structural validation of a resolved package

use crate::error::Error;
use crate::models::PackageJob;
use crate::storage::{BackendKind, StorageBackend};

/// Every problem with the job's entry set, in entry order
pub fn validate_structure(job: &PackageJob, backend: &dyn StorageBackend) -> Vec<Error> {
    let mut problems = Vec::new();
    validate_manifest_entry(job, &mut problems);
    validate_entry_names(job, &mut problems);
    validate_sources(job, backend, &mut problems);
    problems
}

fn validate_manifest_entry(job: &PackageJob, problems: &mut Vec<Error>) {
    let name = job.manifest.file_name();
    if !job.entries.contains(&job.manifest.source_path, name) {
        problems.push(Error::archive(format!(
            "manifest {} is not at the archive root",
            name
        )));
    }
}

fn validate_entry_names(job: &PackageJob, problems: &mut Vec<Error>) {
    let names = job
        .entries
        .iter()
        .map(|e| e.archive_entry_name.as_str())
        .chain(job.generated.iter().map(|g| g.archive_entry_name.as_str()));
    for name in names {
        if let Some(reason) = entry_name_problem(name) {
            problems.push(Error::archive(format!("invalid entry name '{}': {}", name, reason)));
        }
    }
}

fn entry_name_problem(name: &str) -> Option<&'static str> {
    if name.trim().is_empty() {
        Some("empty")
    } else if name.starts_with('/') || name.contains(':') {
        Some("not relative")
    } else if name.contains('\\') {
        Some("backslash separator")
    } else if name.split('/').any(|segment| segment == "..") {
        Some("leaves the archive root")
    } else {
        None
    }
}

/// Local sources are re-checked; remote ones were confirmed while resolving
fn validate_sources(job: &PackageJob, backend: &dyn StorageBackend, problems: &mut Vec<Error>) {
    if backend.kind() != BackendKind::Local {
        return;
    }
    for entry in &job.entries {
        if !backend.exists(&entry.source_path) {
            problems.push(Error::not_found(entry.source_path.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("site/index.php", None ; "relative")]
    #[test_case("", Some("empty") ; "empty")]
    #[test_case("/etc/passwd", Some("not relative") ; "absolute")]
    #[test_case("C:/x.php", Some("not relative") ; "drive letter")]
    #[test_case("site\\index.php", Some("backslash separator") ; "backslash")]
    #[test_case("site/../../x.php", Some("leaves the archive root") ; "parent segment")]
    fn test_entry_name_problem(name: &str, expected: Option<&str>) {
        assert_eq!(entry_name_problem(name), expected);
    }
}
