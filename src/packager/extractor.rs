//! Reading finished archives back

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

fn open(archive_path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(archive_path).map_err(|e| Error::io(archive_path.display().to_string(), e))?;
    ZipArchive::new(file)
        .map_err(|e| Error::archive(format!("cannot read {}: {}", archive_path.display(), e)))
}

/// File entry names in archive order (directories are skipped)
pub fn list_archive_entries(archive_path: &Path) -> Result<Vec<String>> {
    let mut archive = open(archive_path)?;
    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive.by_index(i)?;
        if file.is_file() {
            names.push(file.name().to_string());
        }
    }
    Ok(names)
}

pub fn read_archive_entry(archive_path: &Path, name: &str) -> Result<Vec<u8>> {
    let mut archive = open(archive_path)?;
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(Error::not_found(format!("{}!{}", archive_path.display(), name)))
        }
        Err(e) => return Err(e.into()),
    };
    let mut content = Vec::new();
    file.read_to_end(&mut content)
        .map_err(|e| Error::io(format!("{}!{}", archive_path.display(), name), e))?;
    Ok(content)
}
