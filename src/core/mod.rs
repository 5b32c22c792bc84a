/// Core functionality modules
///
/// Project detection and file backups.

pub mod backup;
pub mod project_detector;

pub use backup::{BackedUpFile, BackupManager, BackupReport};
pub use project_detector::{ProjectDetector, ProjectKind};
