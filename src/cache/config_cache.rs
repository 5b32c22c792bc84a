/// Fingerprint-validated project configuration cache
///
/// Answers "what does this project look like?" and only rescans the
/// filesystem when it has to: when there is no usable record on disk, when
/// the record is older than the expiry, or when any tracked file changed.
///
/// Nothing in here fails. A record that can't be read or written just means
/// we scan again.

use super::fingerprint::{epoch_now, fingerprint_all};
use super::models::{CacheRecord, FileFingerprint, ProjectFacts};
use super::scanner::ProjectScanner;
use super::store::CacheStore;
use crate::config::Settings;
use crate::error::CacheError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Project configuration cache, one per process
pub struct ConfigCache {
    root: PathBuf,
    store: CacheStore,
    scanner: ProjectScanner,
    tracked: Vec<String>,
    expiry: Duration,
    current: Option<CacheRecord>,
    scans: usize,
}

impl ConfigCache {
    /// Create a cache for a project root
    ///
    /// The tracked set is the configured list plus the marker file and the
    /// patterns directory, so the payload can never go stale without the
    /// fingerprints noticing.
    pub fn new<P: Into<PathBuf>>(root: P, settings: &Settings) -> Self {
        let root = root.into();

        let mut tracked: Vec<String> = Vec::new();
        for id in settings
            .cache
            .tracked_files
            .iter()
            .chain([&settings.scan.marker_file, &settings.scan.patterns_dir])
        {
            if !id.is_empty() && !tracked.contains(id) {
                tracked.push(id.clone());
            }
        }

        Self {
            store: CacheStore::new(root.join(&settings.cache.file)),
            scanner: ProjectScanner::new(root.clone(), settings, tracked.clone()),
            root,
            tracked,
            expiry: settings.cache.expiry(),
            current: None,
            scans: 0,
        }
    }

    /// Get the project facts
    ///
    /// # Arguments
    /// * `force_reload` - Ignore the copy held in memory and go back to disk
    ///
    /// Order of preference: the in-memory copy, then a valid record on disk,
    /// then a fresh scan (which is persisted if possible).
    pub fn get(&mut self, force_reload: bool) -> &ProjectFacts {
        let record = match self.current.take() {
            Some(record) if !force_reload => record,
            _ => match self.load_valid() {
                Some(record) => record,
                None => self.rebuild(),
            },
        };

        &self.current.insert(record).payload
    }

    /// Check a record against the expiry and the tracked files right now
    pub fn is_valid(&self, record: &CacheRecord) -> bool {
        self.is_valid_at(record, epoch_now())
    }

    /// Same as [`is_valid`](Self::is_valid) with an explicit clock
    pub fn is_valid_at(&self, record: &CacheRecord, now: f64) -> bool {
        let age = record.age_at(now);
        // a record from the future (clock skew) is still fresh
        if age > self.expiry.as_secs_f64() {
            debug!("Cache record expired (age {:.0}s)", age);
            return false;
        }

        let missing = FileFingerprint::missing();
        for id in &self.tracked {
            let stored = record.file_fingerprints.get(id).unwrap_or(&missing);
            let current = FileFingerprint::of(&self.root.join(id));
            if !stored.matches(&current) {
                debug!("Cache invalidated: {} changed", id);
                return false;
            }
        }

        true
    }

    /// Scan the project. Metadata only, never reads file contents.
    pub fn scan(&mut self) -> ProjectFacts {
        self.scans += 1;
        self.scanner.scan()
    }

    /// Drop the persisted record and the in-memory copy
    pub fn invalidate(&mut self) {
        self.current = None;
        match self.store.remove() {
            Ok(()) => debug!("Cache cleared at {}", self.store.path().display()),
            Err(e) => warn!("Could not remove cache file: {}", e),
        }
    }

    /// How many scans this instance has run
    pub fn scan_count(&self) -> usize {
        self.scans
    }

    /// The tracked file ids, in order
    pub fn tracked_files(&self) -> &[String] {
        &self.tracked
    }

    /// Fingerprints of the tracked files as they are now
    pub fn fingerprints(&self) -> BTreeMap<String, FileFingerprint> {
        fingerprint_all(&self.root, &self.tracked)
    }

    /// The record held in memory, if any
    pub fn record(&self) -> Option<&CacheRecord> {
        self.current.as_ref()
    }

    pub fn cache_path(&self) -> &Path {
        self.store.path()
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    // Read the persisted record and keep it only if it still holds
    fn load_valid(&self) -> Option<CacheRecord> {
        match self.store.load() {
            Ok(record) if self.is_valid(&record) => {
                debug!("Using cached project facts");
                Some(record)
            }
            Ok(_) => None,
            Err(CacheError::NotFound) => {
                debug!("No cache record at {}", self.store.path().display());
                None
            }
            Err(CacheError::Corrupt(e)) => {
                warn!("Ignoring corrupt cache record: {}", e);
                None
            }
            Err(CacheError::Io(e)) => {
                warn!("Could not read cache record: {}", e);
                None
            }
        }
    }

    // Fingerprint, scan, stamp, and try to persist. The record is returned
    // either way. Fingerprints come first: a file edited mid-scan then
    // mismatches next time instead of hiding behind its new fingerprint.
    fn rebuild(&mut self) -> CacheRecord {
        let file_fingerprints = self.fingerprints();
        let payload = self.scan();
        let record = CacheRecord {
            created_at: epoch_now(),
            payload,
            file_fingerprints,
        };

        match self.store.save(&record) {
            Ok(()) => info!("Project scanned, cache written to {}", self.store.path().display()),
            Err(e) => warn!("Project scanned, cache not saved: {}", e),
        }

        record
    }
}
