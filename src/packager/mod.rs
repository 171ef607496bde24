//! Archive building, saving and inspection

pub mod builder;
pub mod database;
pub mod extractor;
pub mod pipeline;

pub use builder::{AddSignal, ArchiveBuilder, ArchiveOutput, OpenMode, Target};
pub use database::{DbExporter, ExportedStatements};
pub use extractor::{list_archive_entries, read_archive_entry};
pub use pipeline::PackagePipeline;

use crate::error::{Error, Result};
use crate::models::Diagnostics;
use crate::utils::helpers::backup_file_name;
use std::fs;
use std::path::{Path, PathBuf};

const MAX_BACKUPS: u32 = 9999;

/// Move a finalized archive to `{dest_dir}/{extension_name}.zip`.
///
/// An existing target is renamed to the first free `{name}_NNNN.zip` when
/// `rename_existing` is set, otherwise saving fails.
pub fn save_archive(
    archive: &Path,
    dest_dir: &Path,
    extension_name: &str,
    rename_existing: bool,
    diagnostics: &mut Diagnostics,
) -> Result<PathBuf> {
    if !dest_dir.is_dir() {
        return Err(Error::archive(format!(
            "destination folder {} does not exist",
            dest_dir.display()
        )));
    }
    let file_name = format!("{}.zip", extension_name);
    let target = dest_dir.join(&file_name);

    if target.exists() {
        if !rename_existing {
            return Err(Error::archive(format!(
                "{} already exists; enable renaming to keep a backup",
                target.display()
            )));
        }
        let backup = (1..=MAX_BACKUPS)
            .map(|attempt| dest_dir.join(backup_file_name(&file_name, attempt)))
            .find(|candidate| !candidate.exists())
            .ok_or_else(|| {
                Error::archive(format!("no free backup name left for {}", target.display()))
            })?;
        fs::rename(&target, &backup).map_err(|e| Error::io(target.display().to_string(), e))?;
        diagnostics.add_message(format!(
            "existing archive renamed to {}",
            backup.display()
        ));
    }

    move_file(archive, &target)?;
    diagnostics.add_message(format!("archive saved to {}", target.display()));
    Ok(target)
}

/// Rename, falling back to copy + remove across filesystems
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to).map_err(|e| Error::io(to.display().to_string(), e))?;
    fs::remove_file(from).map_err(|e| Error::io(from.display().to_string(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_archive_keeps_backups() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("out");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("com_hello.zip"), "old").unwrap();
        fs::write(dest.join("com_hello_0001.zip"), "older").unwrap();

        let archive = temp_dir.path().join("tmp.zip");
        fs::write(&archive, "new").unwrap();

        let mut diagnostics = Diagnostics::new();
        let saved = save_archive(&archive, &dest, "com_hello", true, &mut diagnostics).unwrap();
        assert_eq!(saved, dest.join("com_hello.zip"));
        assert_eq!(fs::read_to_string(&saved).unwrap(), "new");
        assert_eq!(fs::read_to_string(dest.join("com_hello_0002.zip")).unwrap(), "old");
        assert!(!archive.exists());
        assert_eq!(diagnostics.messages.len(), 2);
    }

    #[test]
    fn test_save_archive_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("mod_x.zip"), "old").unwrap();
        let archive = temp_dir.path().join("tmp.zip");
        fs::write(&archive, "new").unwrap();

        let result = save_archive(&archive, temp_dir.path(), "mod_x", false, &mut Diagnostics::new());
        assert!(matches!(result, Err(Error::Archive { .. })));
        assert!(archive.exists());
    }
}
