/// Project root and project kind detection
///
/// Finds the directory the assistant is working in by walking up from the
/// current directory, and tells which ecosystems a root belongs to by the
/// marker files sitting in it.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Files or directories that mark a project root
const ROOT_MARKERS: &[&str] = &[
    ".git",
    ".session-keeper",
    "AGENTS.md",
    "Cargo.toml",
    "package.json",
    "pyproject.toml",
    "go.mod",
    "pom.xml",
    "Gemfile",
];

/// Ecosystem a project belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Node,   // package.json
    Rust,   // Cargo.toml
    Python, // requirements.txt, setup.py, pyproject.toml
    Go,     // go.mod
    Java,   // pom.xml, build.gradle
    Ruby,   // Gemfile
}

impl ProjectKind {
    /// Every kind, in the order detection reports them
    pub const ALL: [ProjectKind; 6] = [
        ProjectKind::Node,
        ProjectKind::Rust,
        ProjectKind::Python,
        ProjectKind::Go,
        ProjectKind::Java,
        ProjectKind::Ruby,
    ];

    /// Marker files for this kind; any one of them is enough
    pub fn markers(&self) -> &'static [&'static str] {
        match self {
            ProjectKind::Node => &["package.json"],
            ProjectKind::Rust => &["Cargo.toml"],
            ProjectKind::Python => &["requirements.txt", "setup.py", "pyproject.toml"],
            ProjectKind::Go => &["go.mod"],
            ProjectKind::Java => &["pom.xml", "build.gradle"],
            ProjectKind::Ruby => &["Gemfile"],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProjectKind::Node => "node",
            ProjectKind::Rust => "rust",
            ProjectKind::Python => "python",
            ProjectKind::Go => "go",
            ProjectKind::Java => "java",
            ProjectKind::Ruby => "ruby",
        }
    }
}

impl std::fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Handles project root detection
pub struct ProjectDetector;

impl ProjectDetector {
    /// Find the project root for a path
    ///
    /// Walks up the directory tree until a directory holding one of the root
    /// markers shows up. Falls back to the starting directory.
    ///
    /// # Examples
    /// ```no_run
    /// use session_keeper_lib::core::ProjectDetector;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let root = ProjectDetector::find_root(std::env::current_dir()?)?;
    /// println!("Project root: {}", root.display());
    /// # Ok(())
    /// # }
    /// ```
    pub fn find_root<P: AsRef<Path>>(start_path: P) -> Result<PathBuf> {
        let start_path = start_path.as_ref();

        let absolute_path = if start_path.is_absolute() {
            start_path.to_path_buf()
        } else {
            std::env::current_dir()?.join(start_path)
        };

        let found = absolute_path
            .ancestors()
            .find(|dir| ROOT_MARKERS.iter().any(|m| dir.join(m).exists()));

        Ok(found.unwrap_or(&absolute_path).to_path_buf())
    }

    /// Detect every project kind whose markers sit directly in `root`
    ///
    /// Only stats files; nothing is opened.
    pub fn detect_kinds<P: AsRef<Path>>(root: P) -> Vec<ProjectKind> {
        let root = root.as_ref();

        ProjectKind::ALL
            .iter()
            .copied()
            .filter(|kind| kind.markers().iter().any(|m| root.join(m).exists()))
            .collect()
    }

    /// Get the project name from the root path
    pub fn project_name<P: AsRef<Path>>(project_root: P) -> Option<String> {
        project_root
            .as_ref()
            .file_name()
            .and_then(|name| name.to_str())
            .map(|s| s.to_string())
    }
}
