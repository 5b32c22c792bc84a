/// Data models for the cache record
///
/// These map one-to-one onto the persisted JSON document.

use crate::core::ProjectKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a scan found out about the project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFacts {
    /// Detected ecosystems, in detection order
    pub project_kinds: Vec<ProjectKind>,
    /// Whether the assistant instructions file is present
    pub has_marker_file: bool,
    /// Presence of each tracked file
    pub tracked_files: BTreeMap<String, bool>,
    /// Number of pattern files per category
    pub pattern_counts: BTreeMap<String, usize>,
    pub total_patterns: usize,
}

impl ProjectFacts {
    /// Whether a tracked file was present at scan time
    pub fn is_present(&self, file_id: &str) -> bool {
        self.tracked_files.get(file_id).copied().unwrap_or(false)
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        let kinds = if self.project_kinds.is_empty() {
            "unknown".to_string()
        } else {
            self.project_kinds
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };

        let present = self.tracked_files.values().filter(|p| **p).count();

        format!(
            "{} project | marker file: {} | {} pattern(s) in {} categor{} | tracked files present: {}/{}",
            kinds,
            if self.has_marker_file { "yes" } else { "no" },
            self.total_patterns,
            self.pattern_counts.len(),
            if self.pattern_counts.len() == 1 { "y" } else { "ies" },
            present,
            self.tracked_files.len()
        )
    }
}

/// Cheap identity of a file: size, mtime and existence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFingerprint {
    pub size: u64,
    /// Epoch seconds
    pub modified_at: f64,
    pub exists: bool,
}

/// The persisted unit. Always written and replaced as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    /// Epoch seconds
    pub created_at: f64,
    pub payload: ProjectFacts,
    #[serde(default)]
    pub file_fingerprints: BTreeMap<String, FileFingerprint>,
}

impl CacheRecord {
    /// Age in seconds relative to `now` (epoch seconds)
    pub fn age_at(&self, now: f64) -> f64 {
        now - self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_facts() -> ProjectFacts {
        let mut facts = ProjectFacts {
            project_kinds: vec![ProjectKind::Rust],
            has_marker_file: true,
            ..Default::default()
        };
        facts.tracked_files.insert("AGENTS.md".to_string(), true);
        facts.tracked_files.insert("go.mod".to_string(), false);
        facts.pattern_counts.insert("testing".to_string(), 3);
        facts.total_patterns = 3;
        facts
    }

    #[test]
    fn test_summary() {
        let summary = sample_facts().summary();
        assert!(summary.starts_with("rust project"));
        assert!(summary.contains("marker file: yes"));
        assert!(summary.contains("3 pattern(s) in 1 category"));
        assert!(summary.contains("1/2"));
    }

    #[test]
    fn test_summary_unknown_project() {
        let summary = ProjectFacts::default().summary();
        assert!(summary.starts_with("unknown project"));
        assert!(summary.contains("0 categories"));
    }

    #[test]
    fn test_is_present() {
        let facts = sample_facts();
        assert!(facts.is_present("AGENTS.md"));
        assert!(!facts.is_present("go.mod"));
        assert!(!facts.is_present("never-tracked.md"));
    }

    #[test]
    fn test_record_json_shape() {
        let mut record = CacheRecord {
            created_at: 1_700_000_000.25,
            payload: sample_facts(),
            file_fingerprints: BTreeMap::new(),
        };
        record.file_fingerprints.insert(
            "A.md".to_string(),
            FileFingerprint {
                size: 1,
                modified_at: 1_699_999_999.5,
                exists: true,
            },
        );

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["createdAt"], serde_json::json!(1_700_000_000.25));
        assert_eq!(value["fileFingerprints"]["A.md"]["size"], 1);
        assert_eq!(value["fileFingerprints"]["A.md"]["exists"], true);
        assert_eq!(value["payload"]["hasMarkerFile"], true);
        assert_eq!(value["payload"]["projectKinds"][0], "rust");
    }

    #[test]
    fn test_age() {
        let record = CacheRecord {
            created_at: 100.0,
            payload: ProjectFacts::default(),
            file_fingerprints: BTreeMap::new(),
        };
        assert_eq!(record.age_at(150.0), 50.0);
    }
}
