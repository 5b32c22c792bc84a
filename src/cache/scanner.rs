/// Project scanner - figures out what the project looks like
///
/// Metadata only. We check what exists and count directory entries, we never
/// open a file. If something disappears halfway through we just count it as
/// not there.

use super::models::ProjectFacts;
use crate::config::Settings;
use crate::core::ProjectDetector;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

// Pattern files sitting directly in the patterns dir go here
const UNCATEGORIZED: &str = "uncategorized";

pub struct ProjectScanner {
    root: PathBuf,
    marker_file: String,
    patterns_dir: String,
    tracked: Vec<String>,
}

impl ProjectScanner {
    pub fn new<P: Into<PathBuf>>(root: P, settings: &Settings, tracked: Vec<String>) -> Self {
        Self {
            root: root.into(),
            marker_file: settings.scan.marker_file.clone(),
            patterns_dir: settings.scan.patterns_dir.clone(),
            tracked,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // Run the full scan. Same filesystem in, same facts out.
    pub fn scan(&self) -> ProjectFacts {
        let pattern_counts = self.count_patterns();
        let total_patterns = pattern_counts.values().sum();

        let tracked_files = self
            .tracked
            .iter()
            .map(|id| (id.clone(), self.root.join(id).exists()))
            .collect();

        ProjectFacts {
            project_kinds: ProjectDetector::detect_kinds(&self.root),
            has_marker_file: self.root.join(&self.marker_file).is_file(),
            tracked_files,
            pattern_counts,
            total_patterns,
        }
    }

    // One category per subdirectory of the patterns dir
    fn count_patterns(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();

        let entries = match fs::read_dir(self.root.join(&self.patterns_dir)) {
            Ok(entries) => entries,
            Err(_) => return counts,
        };

        for entry in entries.flatten() {
            if is_hidden(&entry.file_name()) {
                continue;
            }

            let Ok(file_type) = entry.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                let category = entry.file_name().to_string_lossy().to_string();
                counts.insert(category, count_files(&entry.path()));
            } else if file_type.is_file() {
                *counts.entry(UNCATEGORIZED.to_string()).or_insert(0) += 1;
            }
        }

        counts
    }
}

fn count_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .filter(|e| !is_hidden(&e.file_name()))
                .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                .count()
        })
        .unwrap_or(0)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}
