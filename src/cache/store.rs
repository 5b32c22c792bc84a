/// On-disk storage for the cache record
///
/// One JSON file. Writes go to a sibling temp file first and are renamed
/// into place, so a reader sees either the old record or the new one.

use super::models::CacheRecord;
use crate::error::CacheError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File-backed store for a single cache record
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Get the record file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record
    ///
    /// # Returns
    /// * `Ok(CacheRecord)` - Parsed record
    /// * `Err(CacheError::NotFound)` - Nothing stored yet
    /// * `Err(CacheError::Corrupt)` - File exists but isn't a record
    pub fn load(&self) -> Result<CacheRecord, CacheError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(CacheError::NotFound),
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Replace the stored record
    pub fn save(&self, record: &CacheRecord) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(record)?;
        let tmp_path = self.tmp_path();

        fs::write(&tmp_path, json)?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        Ok(())
    }

    /// Delete the stored record. Deleting nothing is fine.
    pub fn remove(&self) -> Result<(), CacheError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
