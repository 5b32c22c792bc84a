/// Error types for session-keeper
///
/// This module defines all possible errors that can occur in the application.
/// Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Main error type for session-keeper operations
#[derive(Error, Debug)]
pub enum KeeperError {
    /// I/O errors (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Git-related errors
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No session to act on
    #[error("No active session")]
    NoActiveSession,

    /// A session is already running
    #[error("Session {0} is already active")]
    SessionAlreadyActive(String),

    /// Backup destination already exists
    #[error("Backup directory already exists: {0}")]
    BackupExists(String),

    /// Copied file does not match its source
    #[error("Backup verification failed for {0}")]
    BackupVerification(String),

    /// Bad user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for session-keeper operations
pub type Result<T> = std::result::Result<T, KeeperError>;

/// Convert KeeperError to a user-friendly error message
impl KeeperError {
    pub fn user_message(&self) -> String {
        match self {
            KeeperError::Io(e) => {
                format!("File system error. Check permissions. Details: {}", e)
            }
            KeeperError::Git(e) => {
                format!("Git operation failed. Details: {}", e)
            }
            KeeperError::Serialization(e) => {
                format!("Data format error: {}", e)
            }
            KeeperError::Config(msg) => {
                format!("Configuration issue: {}", msg)
            }
            KeeperError::NoActiveSession => {
                "No session found. Start one with 'session-keeper session start'".to_string()
            }
            KeeperError::SessionAlreadyActive(id) => {
                format!("Session '{}' is still open. Hand it off first.", id)
            }
            KeeperError::BackupExists(dir) => {
                format!("A backup named '{}' already exists", dir)
            }
            KeeperError::BackupVerification(file) => {
                format!("Backup copy of '{}' does not match the original", file)
            }
            KeeperError::InvalidInput(msg) => msg.clone(),
        }
    }
}

/// Errors from reading or writing the persisted cache record.
///
/// None of these reach the user: the cache treats every one of them as a miss.
#[derive(Error, Debug)]
pub enum CacheError {
    /// No record on disk
    #[error("Cache not found")]
    NotFound,

    /// Read or write failed
    #[error("Cache IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record exists but is not a valid document
    #[error("Cache is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
