/// File fingerprints
///
/// (size, mtime, exists) is enough to notice that someone touched a file,
/// and it only costs one stat call. We never read contents here.

use super::models::FileFingerprint;
use chrono::Utc;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

impl FileFingerprint {
    /// Fingerprint for a path that isn't there
    pub fn missing() -> Self {
        Self {
            size: 0,
            modified_at: 0.0,
            exists: false,
        }
    }

    /// Stat a path. Anything we can't stat counts as missing.
    pub fn of(path: &Path) -> Self {
        match fs::metadata(path) {
            Ok(meta) => Self {
                size: meta.len(),
                // some filesystems don't give us an mtime; size still counts
                modified_at: meta.modified().map(epoch_seconds).unwrap_or(0.0),
                exists: true,
            },
            Err(_) => Self::missing(),
        }
    }

    /// Same file state? Two missing files always match.
    pub fn matches(&self, other: &FileFingerprint) -> bool {
        match (self.exists, other.exists) {
            (false, false) => true,
            (true, true) => self.size == other.size && self.modified_at == other.modified_at,
            _ => false,
        }
    }
}

/// Fingerprint every tracked path, keyed by its id (the path as configured)
pub fn fingerprint_all(root: &Path, tracked: &[String]) -> BTreeMap<String, FileFingerprint> {
    tracked
        .iter()
        .map(|id| (id.clone(), FileFingerprint::of(&root.join(id))))
        .collect()
}

/// Convert a system time to epoch seconds
pub fn epoch_seconds(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

/// Current wall-clock time in epoch seconds
pub fn epoch_now() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let fp = FileFingerprint::of(&temp.path().join("nope.md"));
        assert!(!fp.exists);
        assert_eq!(fp, FileFingerprint::missing());
    }

    #[test]
    fn test_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("A.md");
        fs::write(&path, "x").unwrap();

        let fp = FileFingerprint::of(&path);
        assert!(fp.exists);
        assert_eq!(fp.size, 1);
        assert!(fp.modified_at > 0.0);
    }

    #[test]
    fn test_matches() {
        let a = FileFingerprint {
            size: 3,
            modified_at: 10.0,
            exists: true,
        };
        let mut b = a.clone();
        assert!(a.matches(&b));

        b.size = 4;
        assert!(!a.matches(&b));

        b = a.clone();
        b.modified_at = 10.5;
        assert!(!a.matches(&b));

        assert!(!a.matches(&FileFingerprint::missing()));
        assert!(!FileFingerprint::missing().matches(&a));

        // stale size/mtime on a missing entry doesn't matter
        let gone = FileFingerprint {
            size: 99,
            modified_at: 5.0,
            exists: false,
        };
        assert!(gone.matches(&FileFingerprint::missing()));
    }

    #[test]
    fn test_fingerprint_all_covers_every_path() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("A.md"), "hello").unwrap();

        let tracked = vec!["A.md".to_string(), "B.md".to_string()];
        let fps = fingerprint_all(temp.path(), &tracked);

        assert_eq!(fps.len(), 2);
        assert!(fps["A.md"].exists);
        assert_eq!(fps["A.md"].size, 5);
        assert!(!fps["B.md"].exists);
    }

    #[test]
    fn test_epoch_seconds() {
        assert_eq!(epoch_seconds(UNIX_EPOCH), 0.0);
        assert_eq!(epoch_seconds(UNIX_EPOCH + Duration::from_millis(1500)), 1.5);
        assert_eq!(epoch_seconds(UNIX_EPOCH - Duration::from_secs(2)), -2.0);
        assert!(epoch_now() > 1_600_000_000.0);
    }
}
