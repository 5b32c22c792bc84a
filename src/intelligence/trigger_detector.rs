/// Spots phrases like "let's pause here" or "time for a handoff"
///
/// Ordered table of regexes, checked against the lowercased text. First match
/// wins, so handoff comes before pause ("pause and hand off" is a handoff).

use crate::config::TriggerRule;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

// Built-in phrases, in priority order
const TRIGGER_PATTERNS: &[(&str, TriggerAction)] = &[
    (r"\bhand\s*-?\s*off\b", TriggerAction::Handoff),
    (r"\bpass (this|it) (on|over)\b", TriggerAction::Handoff),
    (r"\bfresh session\b", TriggerAction::Handoff),
    (r"\bcheckpoint\b", TriggerAction::Checkpoint),
    (r"\bsave (my |our |the )?progress\b", TriggerAction::Checkpoint),
    (r"\bsnapshot\b", TriggerAction::Checkpoint),
    (r"\bresume\b", TriggerAction::Resume),
    (r"\bpick (it |this )?up where\b", TriggerAction::Resume),
    (r"\bwhere (were|did) we\b", TriggerAction::Resume),
    (r"\bpause\b", TriggerAction::Pause),
    (r"\bstop(ping)? (here|for now|for today)\b", TriggerAction::Pause),
    (r"\bcall it a (day|night)\b", TriggerAction::Pause),
    (r"\bbreak time\b", TriggerAction::Pause),
];

/// What a trigger phrase asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerAction {
    Pause,
    Handoff,
    Checkpoint,
    Resume,
}

impl TriggerAction {
    pub fn label(&self) -> &'static str {
        match self {
            TriggerAction::Pause => "pause",
            TriggerAction::Handoff => "handoff",
            TriggerAction::Checkpoint => "checkpoint",
            TriggerAction::Resume => "resume",
        }
    }
}

impl std::fmt::Display for TriggerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Result of a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerMatch {
    pub matched: bool,
    pub label: Option<TriggerAction>,
}

impl TriggerMatch {
    fn none() -> Self {
        Self {
            matched: false,
            label: None,
        }
    }
}

pub struct TriggerDetector {
    rules: Vec<(Regex, TriggerAction)>,
}

impl TriggerDetector {
    pub fn new() -> Self {
        Self::with_rules(&[])
    }

    // User rules go first so they can override the built-ins. They are
    // matched case-insensitively; the pattern text itself is left alone so
    // escapes like `\S` keep their meaning.
    // A rule that doesn't compile is skipped with a warning.
    pub fn with_rules(extra: &[TriggerRule]) -> Self {
        let custom = extra.iter().filter_map(|rule| {
            match RegexBuilder::new(&rule.pattern)
                .case_insensitive(true)
                .build()
            {
                Ok(regex) => Some((regex, rule.action)),
                Err(e) => {
                    tracing::warn!("Skipping trigger pattern '{}': {}", rule.pattern, e);
                    None
                }
            }
        });

        // built-in patterns are constants, they always compile
        let builtin = TRIGGER_PATTERNS
            .iter()
            .filter_map(|(pattern, action)| Regex::new(pattern).ok().map(|r| (r, *action)));

        Self {
            rules: custom.chain(builtin).collect(),
        }
    }

    // Check free text for a trigger phrase
    pub fn detect(&self, text: &str) -> TriggerMatch {
        let lowercase = text.to_lowercase();

        self.rules
            .iter()
            .find(|(regex, _)| regex.is_match(&lowercase))
            .map(|(_, action)| TriggerMatch {
                matched: true,
                label: Some(*action),
            })
            .unwrap_or_else(TriggerMatch::none)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Default for TriggerDetector {
    fn default() -> Self {
        Self::new()
    }
}
