/// Session module
///
/// Session, checkpoint and handoff bookkeeping, kept as JSON state plus
/// Markdown documents the assistant can read next time.

pub mod manager;
pub mod markdown;
pub mod models;

pub use manager::SessionManager;
pub use models::{Checkpoint, SessionState, SessionStatus};
