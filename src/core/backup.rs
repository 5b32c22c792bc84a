/// Backs up the files the assistant depends on (instructions, status, handoff)
///
/// Copy, then check the copy: same size and same SHA-256 as the source, or
/// the backup counts as failed.

use crate::config::Settings;
use crate::error::{KeeperError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

const MANIFEST_FILE: &str = "manifest.json";

// Keeps directory names shell-friendly
const MAX_NAME_LENGTH: usize = 64;

/// One file that went into a backup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackedUpFile {
    pub path: String,
    pub size: u64,
    pub sha256: String,
}

/// What got backed up and why. Also written as the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupReport {
    /// Name of the created directory (not the full path)
    pub directory: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub files: Vec<BackedUpFile>,
    /// Listed files that didn't exist
    pub skipped: Vec<String>,
}

pub struct BackupManager {
    root: PathBuf,
    backup_dir: PathBuf,
    files: Vec<String>,
}

impl BackupManager {
    pub fn new<P: Into<PathBuf>>(project_root: P, settings: &Settings) -> Self {
        let root = project_root.into();
        Self {
            backup_dir: root.join(&settings.backup.dir),
            files: settings.backup.files.clone(),
            root,
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    // Create a backup named `name`.
    //
    // Returns the report when every copied file verified. On a mismatch the
    // half-made directory is left in place for inspection and the error names
    // the file. Entries must be relative paths inside the project; anything
    // else fails the whole backup before a directory is made.
    pub fn create(&self, name: &str, reason: &str) -> Result<BackupReport> {
        for file in &self.files {
            check_entry(file)?;
        }

        let created_at = Utc::now();
        let directory = format!(
            "{}_{}",
            created_at.format("%Y%m%d_%H%M%S"),
            sanitize_name(name)?
        );
        let dest = self.backup_dir.join(&directory);

        fs::create_dir_all(&self.backup_dir)?;
        match fs::create_dir(&dest) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(KeeperError::BackupExists(directory));
            }
            Err(e) => return Err(e.into()),
        }

        let mut report = BackupReport {
            directory,
            reason: reason.trim().to_string(),
            created_at,
            files: Vec::new(),
            skipped: Vec::new(),
        };

        for file in &self.files {
            let source = self.root.join(file);
            if !source.is_file() {
                tracing::debug!("Skipping {}: not found", file);
                report.skipped.push(file.clone());
                continue;
            }

            let target = dest.join(file);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            if same_file(&source, &target)? {
                return Err(KeeperError::InvalidInput(format!(
                    "backup entry '{}' resolves to its own source",
                    file
                )));
            }
            fs::copy(&source, &target)?;

            report.files.push(verify_copy(file, &source, &target)?);
        }

        let manifest = serde_json::to_string_pretty(&report)?;
        fs::write(dest.join(MANIFEST_FILE), manifest)?;

        tracing::info!(
            "Backup {} created: {} file(s), {} skipped",
            report.directory,
            report.files.len(),
            report.skipped.len()
        );

        Ok(report)
    }

    // Existing backups, newest first. Names start with a timestamp, so
    // sorting by name is sorting by age.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.backup_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names: Vec<String> = entries
            .flatten()
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();

        names.sort_unstable_by(|a, b| b.cmp(a));
        Ok(names)
    }

    // Read a backup's manifest
    pub fn manifest(&self, directory: &str) -> Result<BackupReport> {
        let content = fs::read_to_string(self.backup_dir.join(directory).join(MANIFEST_FILE))?;
        Ok(serde_json::from_str(&content)?)
    }
}

// Backup entries are joined onto both the project root and the backup
// directory, so they must stay relative and never climb out.
fn check_entry(file: &str) -> Result<()> {
    let path = Path::new(file);
    let escapes = path.components().any(|c| {
        matches!(c, Component::RootDir | Component::Prefix(_) | Component::ParentDir)
    });

    if file.trim().is_empty() || escapes {
        return Err(KeeperError::InvalidInput(format!(
            "backup entry '{}' must be a relative path inside the project",
            file
        )));
    }
    Ok(())
}

// True when the copy target is the source itself (through a symlink, say).
// The target may not exist yet; its parent does.
fn same_file(source: &Path, target: &Path) -> Result<bool> {
    let source = fs::canonicalize(source)?;
    let target = match fs::canonicalize(target) {
        Ok(path) => path,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            match (target.parent(), target.file_name()) {
                (Some(parent), Some(name)) => fs::canonicalize(parent)?.join(name),
                _ => return Ok(false),
            }
        }
        Err(e) => return Err(e.into()),
    };
    Ok(source == target)
}

// Compare size and digest of source and copy
fn verify_copy(file: &str, source: &Path, target: &Path) -> Result<BackedUpFile> {
    let source_size = fs::metadata(source)?.len();
    let target_size = fs::metadata(target)?.len();
    if source_size != target_size {
        return Err(KeeperError::BackupVerification(file.to_string()));
    }

    let source_hash = sha256_file(source)?;
    if source_hash != sha256_file(target)? {
        return Err(KeeperError::BackupVerification(file.to_string()));
    }

    Ok(BackedUpFile {
        path: file.to_string(),
        size: source_size,
        sha256: source_hash,
    })
}

/// Hex SHA-256 of a file's contents
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

// Turn free text into something safe for a directory name
fn sanitize_name(name: &str) -> Result<String> {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .take(MAX_NAME_LENGTH)
        .collect();

    let cleaned = cleaned.trim_matches('-').to_string();
    if cleaned.is_empty() {
        return Err(KeeperError::InvalidInput(
            "backup name must contain letters or digits".to_string(),
        ));
    }

    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (BackupManager, TempDir) {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("AGENTS.md"), "# Rules\nbe nice\n").unwrap();
        fs::write(temp.path().join("HANDOFF.md"), "next: tests").unwrap();
        let manager = BackupManager::new(temp.path(), &Settings::default());
        (manager, temp)
    }

    #[test]
    fn test_create_backup() {
        let (manager, _temp) = setup();

        let report = manager.create("before refactor", "big change").unwrap();
        assert!(report.directory.ends_with("_before-refactor"));
        assert_eq!(report.reason, "big change");
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.skipped, vec!["PROJECT_STATUS.md".to_string()]);

        let dest = manager.backup_dir().join(&report.directory);
        assert_eq!(
            fs::read_to_string(dest.join("AGENTS.md")).unwrap(),
            "# Rules\nbe nice\n"
        );
        assert!(dest.join(MANIFEST_FILE).exists());
    }

    #[test]
    fn test_checksums_recorded() {
        let (manager, temp) = setup();

        let report = manager.create("sums", "").unwrap();
        let agents = report.files.iter().find(|f| f.path == "AGENTS.md").unwrap();
        assert_eq!(agents.size, 16);
        assert_eq!(agents.sha256.len(), 64);
        assert_eq!(
            agents.sha256,
            sha256_file(&temp.path().join("AGENTS.md")).unwrap()
        );
    }

    #[test]
    fn test_sha256_known_value() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("abc.txt");
        fs::write(&path, "abc").unwrap();

        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_manifest_roundtrip() {
        let (manager, _temp) = setup();

        let report = manager.create("manifest", "check it").unwrap();
        let manifest = manager.manifest(&report.directory).unwrap();
        assert_eq!(manifest.files, report.files);
        assert_eq!(manifest.reason, "check it");
    }

    #[test]
    fn test_list_newest_first() {
        let (manager, _temp) = setup();
        assert!(manager.list().unwrap().is_empty());

        fs::create_dir_all(manager.backup_dir().join("20240101_000000_old")).unwrap();
        fs::create_dir_all(manager.backup_dir().join("20250101_000000_new")).unwrap();

        let names = manager.list().unwrap();
        assert_eq!(names, vec!["20250101_000000_new", "20240101_000000_old"]);
    }

    #[test]
    fn test_duplicate_name_in_same_second() {
        let (manager, _temp) = setup();

        let first = manager.create("dup", "").unwrap();
        // pre-create whatever name the next call would pick to force a clash
        let now = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let clash = format!("{}_dup", now);
        if clash != first.directory {
            fs::create_dir(manager.backup_dir().join(&clash)).unwrap();
        }

        match manager.create("dup", "") {
            Err(KeeperError::BackupExists(dir)) => assert!(dir.ends_with("_dup")),
            // the clock ticked between the two lines above
            Ok(report) => assert_ne!(report.directory, first.directory),
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("pre release/v2").unwrap(), "pre-release-v2");
        assert_eq!(sanitize_name("  ok_name  ").unwrap(), "ok_name");
        assert!(sanitize_name("///").is_err());
        assert_eq!(sanitize_name(&"x".repeat(200)).unwrap().len(), MAX_NAME_LENGTH);
    }

    fn manager_with_files(temp: &TempDir, files: &[&str]) -> BackupManager {
        let mut settings = Settings::default();
        settings.backup.files = files.iter().map(|f| f.to_string()).collect();
        BackupManager::new(temp.path(), &settings)
    }

    #[test]
    fn test_absolute_entry_rejected_and_source_untouched() {
        let temp = TempDir::new().unwrap();
        let notes = temp.path().join("notes.md");
        fs::write(&notes, "important notes").unwrap();

        let manager = manager_with_files(&temp, &[notes.to_str().unwrap()]);
        match manager.create("abs", "") {
            Err(KeeperError::InvalidInput(msg)) => assert!(msg.contains("notes.md")),
            other => panic!("expected InvalidInput, got {:?}", other.map(|r| r.directory)),
        }

        assert_eq!(fs::read_to_string(&notes).unwrap(), "important notes");
        assert!(manager.list().unwrap().is_empty());
    }

    #[test]
    fn test_parent_entry_rejected_and_nothing_written_outside() {
        let outer = TempDir::new().unwrap();
        let project = outer.path().join("project");
        fs::create_dir(&project).unwrap();
        fs::write(project.join("AGENTS.md"), "rules").unwrap();
        fs::write(outer.path().join("secret.md"), "outside").unwrap();

        let manager = BackupManager::new(&project, &{
            let mut settings = Settings::default();
            settings.backup.files = vec!["AGENTS.md".to_string(), "../secret.md".to_string()];
            settings
        });

        assert!(matches!(
            manager.create("up", ""),
            Err(KeeperError::InvalidInput(_))
        ));

        // neither a backup directory nor a stray copy next to the project
        assert!(!manager.backup_dir().exists());
        let names: Vec<String> = fs::read_dir(outer.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names.len(), 2, "unexpected entries: {:?}", names);
        assert_eq!(
            fs::read_to_string(outer.path().join("secret.md")).unwrap(),
            "outside"
        );
    }

    #[test]
    fn test_check_entry() {
        assert!(check_entry("AGENTS.md").is_ok());
        assert!(check_entry("docs/notes.md").is_ok());
        assert!(check_entry("./AGENTS.md").is_ok());
        assert!(check_entry("/etc/hosts").is_err());
        assert!(check_entry("../x.md").is_err());
        assert!(check_entry("docs/../../x.md").is_err());
        assert!(check_entry("  ").is_err());
    }

    #[test]
    fn test_same_file() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.md");
        let b = temp.path().join("b.md");
        fs::write(&a, "a").unwrap();

        assert!(same_file(&a, &a).unwrap());
        assert!(same_file(&a, &temp.path().join(".").join("a.md")).unwrap());
        // b doesn't exist yet, as a fresh copy target wouldn't
        assert!(!same_file(&a, &b).unwrap());
    }

    #[test]
    fn test_verify_copy_size_mismatch() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("AGENTS.md");
        let target = temp.path().join("copy.md");
        fs::write(&source, "# Rules\nbe nice\n").unwrap();
        fs::write(&target, "# Rules\n").unwrap();

        match verify_copy("AGENTS.md", &source, &target) {
            Err(KeeperError::BackupVerification(file)) => assert_eq!(file, "AGENTS.md"),
            other => panic!("expected BackupVerification, got {:?}", other),
        }
    }

    #[test]
    fn test_verify_copy_digest_mismatch() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("HANDOFF.md");
        let target = temp.path().join("copy.md");
        fs::write(&source, "next: tests").unwrap();
        // same length, one byte different
        fs::write(&target, "next: Tests").unwrap();

        match verify_copy("HANDOFF.md", &source, &target) {
            Err(KeeperError::BackupVerification(file)) => assert_eq!(file, "HANDOFF.md"),
            other => panic!("expected BackupVerification, got {:?}", other),
        }
    }

    #[test]
    fn test_verify_copy_match() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("AGENTS.md");
        let target = temp.path().join("copy.md");
        fs::write(&source, "abc").unwrap();
        fs::copy(&source, &target).unwrap();

        let entry = verify_copy("AGENTS.md", &source, &target).unwrap();
        assert_eq!(entry.size, 3);
        assert_eq!(
            entry.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
