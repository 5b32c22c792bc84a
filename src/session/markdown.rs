/// Markdown rendering for checkpoints and handoffs
///
/// Plain string building. These files are read by people and by the
/// assistant at the start of its next session.

use super::models::{Checkpoint, SessionState};
use crate::intelligence::GitSnapshot;
use chrono::{DateTime, Utc};
use std::fmt::Write;

pub fn render_checkpoint(state: &SessionState, checkpoint: &Checkpoint) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Checkpoint {} - session {}", checkpoint.number, state.id);
    let _ = writeln!(out);
    let _ = writeln!(out, "- **Saved:** {}", format_time(checkpoint.created_at));
    let _ = writeln!(out, "- **Time of day:** {}", checkpoint.time_of_day);
    if let Some(goal) = &state.goal {
        let _ = writeln!(out, "- **Goal:** {}", goal);
    }
    write_git_line(&mut out, checkpoint.git.as_ref());
    let _ = writeln!(out);
    let _ = writeln!(out, "## Note");
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", checkpoint.note);

    out
}

pub fn render_handoff(
    state: &SessionState,
    summary: &str,
    next_steps: &[String],
    git: Option<&GitSnapshot>,
    now: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Handoff - session {}", state.id);
    let _ = writeln!(out);
    let _ = writeln!(out, "- **Started:** {}", format_time(state.started_at));
    let _ = writeln!(out, "- **Handed off:** {}", format_time(now));
    let _ = writeln!(out, "- **Duration:** {} min", state.duration_minutes(now));
    if let Some(goal) = &state.goal {
        let _ = writeln!(out, "- **Goal:** {}", goal);
    }
    write_git_line(&mut out, git);

    let _ = writeln!(out);
    let _ = writeln!(out, "## Summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", summary.trim());

    let _ = writeln!(out);
    let _ = writeln!(out, "## Checkpoints");
    let _ = writeln!(out);
    if state.checkpoints.is_empty() {
        let _ = writeln!(out, "_None recorded._");
    }
    for cp in &state.checkpoints {
        let _ = writeln!(
            out,
            "{}. {} ({})",
            cp.number,
            cp.note,
            cp.created_at.format("%H:%M")
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Next steps");
    let _ = writeln!(out);
    if next_steps.is_empty() {
        let _ = writeln!(out, "- [ ] Review the summary above and pick up from there");
    }
    for step in next_steps {
        let _ = writeln!(out, "- [ ] {}", step.trim());
    }

    out
}

fn write_git_line(out: &mut String, git: Option<&GitSnapshot>) {
    if let Some(git) = git {
        let _ = writeln!(out, "- **Git:** {}", git);
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M UTC").to_string()
}
