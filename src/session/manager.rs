/// Session bookkeeping
///
/// Keeps one session's state in `current.json`, writes a Markdown file per
/// checkpoint, and produces the handoff document when the session ends.

use super::markdown::{render_checkpoint, render_handoff};
use super::models::{Checkpoint, SessionState, SessionStatus};
use crate::config::Settings;
use crate::error::{KeeperError, Result};
use crate::intelligence::ContextDetector;
use chrono::Utc;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

const CURRENT_FILE: &str = "current.json";
const CHECKPOINTS_DIR: &str = "checkpoints";
const HISTORY_DIR: &str = "history";

/// Session manager for one project
pub struct SessionManager {
    root: PathBuf,
    sessions_dir: PathBuf,
    handoff_path: PathBuf,
}

impl SessionManager {
    /// Create a session manager for a project root
    pub fn new<P: Into<PathBuf>>(project_root: P, settings: &Settings) -> Self {
        let root = project_root.into();
        Self {
            sessions_dir: root.join(&settings.sessions.dir),
            handoff_path: root.join(&settings.sessions.handoff_file),
            root,
        }
    }

    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    pub fn handoff_path(&self) -> &Path {
        &self.handoff_path
    }

    /// Read the current session
    ///
    /// # Returns
    /// * `Ok(None)` - No session has been started here
    /// * `Ok(Some(state))` - The latest session, open or handed off
    pub fn current(&self) -> Result<Option<SessionState>> {
        match fs::read_to_string(self.sessions_dir.join(CURRENT_FILE)) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Start a new session
    ///
    /// Fails while another session is still open (active or paused).
    pub fn start(&self, goal: Option<&str>) -> Result<SessionState> {
        let previous = self.current()?;
        if let Some(existing) = &previous {
            if existing.status.is_open() {
                return Err(KeeperError::SessionAlreadyActive(existing.id.clone()));
            }
        }

        let started_at = Utc::now();
        let id = self.unique_id(
            &started_at.format("%Y%m%d-%H%M%S").to_string(),
            previous.as_ref().map(|p| p.id.as_str()),
        );
        let state = SessionState {
            id,
            started_at,
            goal: goal
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty()),
            status: SessionStatus::Active,
            git: ContextDetector::git_snapshot(&self.root),
            checkpoints: Vec::new(),
            ended_at: None,
        };

        self.save(&state)?;
        info!("Session {} started", state.id);
        Ok(state)
    }

    /// Record a checkpoint, starting a session if none is open
    pub fn checkpoint(&self, note: &str) -> Result<Checkpoint> {
        let note = non_empty(note, "checkpoint note")?;

        let mut state = match self.current()? {
            Some(state) if state.status.is_open() => state,
            _ => self.start(None)?,
        };

        let checkpoint = self.add_checkpoint(&mut state, note)?;
        self.save(&state)?;
        Ok(checkpoint)
    }

    /// Checkpoint and mark the session paused
    pub fn pause(&self, note: Option<&str>) -> Result<Checkpoint> {
        let mut state = self.open_session()?;

        let note = note
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("Paused");

        let checkpoint = self.add_checkpoint(&mut state, note)?;
        state.status = SessionStatus::Paused;
        self.save(&state)?;

        info!("Session {} paused", state.id);
        Ok(checkpoint)
    }

    /// Reopen a paused session
    ///
    /// An already active session is returned as is.
    pub fn resume(&self) -> Result<SessionState> {
        let mut state = self.open_session()?;

        if state.status == SessionStatus::Paused {
            state.status = SessionStatus::Active;
            self.save(&state)?;
            info!("Session {} resumed", state.id);
        }

        Ok(state)
    }

    /// End the session with a handoff document
    ///
    /// Writes the handoff Markdown, archives the state to history, and marks
    /// the session handed off.
    ///
    /// # Returns
    /// * `Ok(PathBuf)` - Path of the written handoff file
    pub fn handoff(&self, summary: &str, next_steps: &[String]) -> Result<PathBuf> {
        let summary = non_empty(summary, "handoff summary")?;
        let mut state = self.open_session()?;

        let now = Utc::now();
        let git = ContextDetector::git_snapshot(&self.root);
        let markdown = render_handoff(&state, summary, next_steps, git.as_ref(), now);

        if let Some(parent) = self.handoff_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.handoff_path, markdown)?;

        state.status = SessionStatus::HandedOff;
        state.ended_at = Some(now);

        let history_dir = self.sessions_dir.join(HISTORY_DIR);
        fs::create_dir_all(&history_dir)?;
        fs::write(
            history_dir.join(format!("{}.json", state.id)),
            serde_json::to_string_pretty(&state)?,
        )?;
        self.save(&state)?;

        info!("Session {} handed off", state.id);
        Ok(self.handoff_path.clone())
    }

    /// Ids of archived sessions, newest first
    pub fn history(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(self.sessions_dir.join(HISTORY_DIR)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids: Vec<String> = entries
            .flatten()
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                name.strip_suffix(".json").map(|id| id.to_string())
            })
            .collect();

        ids.sort_unstable_by(|a, b| b.cmp(a));
        Ok(ids)
    }

    // Ids have one-second resolution. A second session in the same second
    // gets a `-2`, `-3`... suffix so it can't overwrite the archived one.
    fn unique_id(&self, base: &str, previous: Option<&str>) -> String {
        let taken = |id: &str| {
            previous == Some(id)
                || self
                    .sessions_dir
                    .join(HISTORY_DIR)
                    .join(format!("{}.json", id))
                    .exists()
                || self
                    .sessions_dir
                    .join(CHECKPOINTS_DIR)
                    .join(format!("{}-01.md", id))
                    .exists()
        };

        let mut id = base.to_string();
        let mut suffix = 2;
        while taken(&id) {
            id = format!("{}-{}", base, suffix);
            suffix += 1;
        }
        id
    }

    fn open_session(&self) -> Result<SessionState> {
        match self.current()? {
            Some(state) if state.status.is_open() => Ok(state),
            _ => Err(KeeperError::NoActiveSession),
        }
    }

    fn add_checkpoint(&self, state: &mut SessionState, note: &str) -> Result<Checkpoint> {
        let context = ContextDetector::detect(&self.root);
        let number = state.checkpoints.len() + 1;

        let checkpoint = Checkpoint {
            number,
            created_at: context.captured_at,
            note: note.to_string(),
            time_of_day: context.time_of_day,
            git: context.git,
            file: format!("{}-{:02}.md", state.id, number),
        };

        let dir = self.sessions_dir.join(CHECKPOINTS_DIR);
        fs::create_dir_all(&dir)?;
        fs::write(
            dir.join(&checkpoint.file),
            render_checkpoint(state, &checkpoint),
        )?;

        state.checkpoints.push(checkpoint.clone());
        Ok(checkpoint)
    }

    // Write-then-rename so a crash never leaves half a state file
    fn save(&self, state: &SessionState) -> Result<()> {
        fs::create_dir_all(&self.sessions_dir)?;

        let path = self.sessions_dir.join(CURRENT_FILE);
        let tmp_path = self.sessions_dir.join(format!("{}.tmp", CURRENT_FILE));
        fs::write(&tmp_path, serde_json::to_string_pretty(state)?)?;
        fs::rename(&tmp_path, &path)?;

        Ok(())
    }
}

fn non_empty<'a>(text: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(KeeperError::InvalidInput(format!("{} cannot be empty", what)));
    }
    Ok(trimmed)
}
