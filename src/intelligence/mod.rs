/// Intelligence module
///
/// Reads the situation: trigger phrases in free text and the current
/// working context.

pub mod context_detector;
pub mod trigger_detector;

pub use context_detector::{Context, ContextDetector, GitSnapshot, TimeOfDay};
pub use trigger_detector::{TriggerAction, TriggerDetector, TriggerMatch};
