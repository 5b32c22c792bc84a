/// Session data models
///
/// Serialized as JSON under the sessions directory.

use crate::intelligence::{GitSnapshot, TimeOfDay};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Paused,
    HandedOff,
}

impl SessionStatus {
    /// Active and paused sessions are still open
    pub fn is_open(&self) -> bool {
        !matches!(self, SessionStatus::HandedOff)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Active => "active",
            SessionStatus::Paused => "paused",
            SessionStatus::HandedOff => "handed off",
        };
        write!(f, "{}", s)
    }
}

/// A saved point in a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// 1-based, per session
    pub number: usize,
    pub created_at: DateTime<Utc>,
    pub note: String,
    pub time_of_day: TimeOfDay,
    pub git: Option<GitSnapshot>,
    /// Markdown file name inside the checkpoints directory
    pub file: String,
}

/// Current session state (current.json)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub goal: Option<String>,
    pub status: SessionStatus,
    /// Git state when the session started
    pub git: Option<GitSnapshot>,
    #[serde(default)]
    pub checkpoints: Vec<Checkpoint>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn last_checkpoint(&self) -> Option<&Checkpoint> {
        self.checkpoints.last()
    }

    /// How long the session has been going (or went)
    pub fn duration_minutes(&self, now: DateTime<Utc>) -> i64 {
        let end = self.ended_at.unwrap_or(now);
        (end - self.started_at).num_minutes().max(0)
    }
}
