/// Settings loading
///
/// Reads `.session-keeper/settings.json` from the project, falls back to the
/// one in the home directory, then to built-in defaults. A broken file never
/// stops the tool; it logs a warning and uses defaults instead.

use crate::intelligence::TriggerAction;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory (relative to the project root or home) holding our files
pub const DATA_DIR: &str = ".session-keeper";

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub cache: CacheSettings,
    pub scan: ScanSettings,
    pub sessions: SessionSettings,
    pub backup: BackupSettings,
    /// Extra trigger rules, checked before the built-in ones
    pub triggers: Vec<TriggerRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    /// Cache record location, relative to the project root
    pub file: String,
    pub expiry_secs: u64,
    /// Files whose fingerprints decide whether the record is still good
    pub tracked_files: Vec<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            file: format!("{}/config_cache.json", DATA_DIR),
            expiry_secs: 7200,
            tracked_files: [
                "AGENTS.md",
                "PROJECT_STATUS.md",
                "package.json",
                "Cargo.toml",
                "requirements.txt",
                "setup.py",
                "pyproject.toml",
                "go.mod",
                "pom.xml",
                "Gemfile",
                "patterns",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl CacheSettings {
    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanSettings {
    /// Instructions file the assistant reads on startup
    pub marker_file: String,
    /// Directory whose subdirectories are pattern categories
    pub patterns_dir: String,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            marker_file: "AGENTS.md".to_string(),
            patterns_dir: "patterns".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    pub dir: String,
    pub handoff_file: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            dir: format!("{}/sessions", DATA_DIR),
            handoff_file: "HANDOFF.md".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackupSettings {
    pub dir: String,
    /// Files copied into every backup
    pub files: Vec<String>,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            dir: format!("{}/backups", DATA_DIR),
            files: vec![
                "AGENTS.md".to_string(),
                "PROJECT_STATUS.md".to_string(),
                "HANDOFF.md".to_string(),
            ],
        }
    }
}

/// A user-supplied trigger phrase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerRule {
    pub pattern: String,
    pub action: TriggerAction,
}

impl Settings {
    /// Load settings for a project root
    pub fn load(project_root: &Path) -> Self {
        let project_file = project_root.join(DATA_DIR).join(SETTINGS_FILE);
        if project_file.exists() {
            return Self::load_from_path(&project_file);
        }

        match Self::global_path() {
            Some(global) if global.exists() => Self::load_from_path(&global),
            _ => Self::default(),
        }
    }

    /// Load settings from an explicit file
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => {
                    tracing::debug!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    fn global_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DATA_DIR).join(SETTINGS_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.cache.expiry_secs, 7200);
        assert_eq!(settings.cache.expiry(), Duration::from_secs(7200));
        assert!(settings.cache.tracked_files.contains(&"AGENTS.md".to_string()));
        assert_eq!(settings.scan.patterns_dir, "patterns");
        assert!(settings.triggers.is_empty());
    }

    #[test]
    fn test_partial_settings() {
        let json = r#"{
            "cache": { "expirySecs": 3600 },
            "scan": { "markerFile": "NOTES.md" }
        }"#;

        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.cache.expiry_secs, 3600);
        assert_eq!(settings.cache.file, ".session-keeper/config_cache.json");
        assert_eq!(settings.scan.marker_file, "NOTES.md");
        assert_eq!(settings.scan.patterns_dir, "patterns");
    }

    #[test]
    fn test_trigger_rules() {
        let json = r#"{
            "triggers": [{ "pattern": "brb", "action": "pause" }]
        }"#;

        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.triggers.len(), 1);
        assert_eq!(settings.triggers[0].action, TriggerAction::Pause);
    }

    #[test]
    fn test_load_from_project() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(DATA_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(SETTINGS_FILE),
            r#"{ "cache": { "trackedFiles": ["A.md"] } }"#,
        )
        .unwrap();

        let settings = Settings::load(temp.path());
        assert_eq!(settings.cache.tracked_files, vec!["A.md".to_string()]);
    }

    #[test]
    fn test_malformed_settings_fall_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(SETTINGS_FILE);
        fs::write(&path, "{ this is not json").unwrap();

        let settings = Settings::load_from_path(&path);
        assert_eq!(settings.cache.expiry_secs, 7200);
    }
}
