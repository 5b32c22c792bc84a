// session-keeper - remembers where you and your assistant left off
//
// This is the main entry point. Parses CLI args and dispatches to handlers.

use anyhow::Context as _;
use session_keeper_lib::{
    core::{BackupManager, ProjectDetector},
    intelligence::{TriggerAction, TriggerDetector},
    session::SessionManager,
    ConfigCache, KeeperError, Settings,
};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    let command = &args[1];

    match command.as_str() {
        "status" => handle_status(),
        "scan" => handle_scan(&args[2..]),
        "invalidate" => handle_invalidate(),
        "trigger" => handle_trigger(&args[2..]),
        "hook" => handle_hook(&args[2..]),
        "backup" => handle_backup(&args[2..]),
        "backups" => handle_backups(),
        "session" => handle_session(&args[2..]),
        "version" | "-v" | "--version" => {
            println!("session-keeper v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "-h" | "--help" => {
            print_usage();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            Ok(())
        }
    }
}

/// Everything a handler needs to know about where it runs
struct Workspace {
    root: PathBuf,
    settings: Settings,
}

impl Workspace {
    fn detect() -> anyhow::Result<Self> {
        let cwd = env::current_dir().context("could not read the current directory")?;
        let root = ProjectDetector::find_root(&cwd)?;
        let settings = Settings::load(&root);
        Ok(Self { root, settings })
    }

    fn cache(&self) -> ConfigCache {
        ConfigCache::new(self.root.clone(), &self.settings)
    }

    fn sessions(&self) -> SessionManager {
        SessionManager::new(self.root.clone(), &self.settings)
    }
}

fn handle_status() -> anyhow::Result<()> {
    let ws = Workspace::detect()?;
    let mut cache = ws.cache();

    let name = ProjectDetector::project_name(&ws.root).unwrap_or_else(|| "project".to_string());
    println!("{}: {}", name, cache.get(false).summary());

    match ws.sessions().current() {
        Ok(Some(state)) => println!(
            "session {}: {} ({} checkpoint(s))",
            state.id,
            state.status,
            state.checkpoints.len()
        ),
        Ok(None) => println!("session: none"),
        Err(e) => eprintln!("session: unreadable ({})", e.user_message()),
    }

    Ok(())
}

fn handle_scan(args: &[String]) -> anyhow::Result<()> {
    let ws = Workspace::detect()?;
    let mut cache = ws.cache();

    if args.iter().any(|a| a == "--force") {
        cache.invalidate();
    }

    let facts = cache.get(false).clone();
    let scanned = cache.scan_count() > 0;

    println!("\nProject scan: {}", ws.root.display());
    println!("{}", "=".repeat(60));

    let kinds: Vec<String> = facts.project_kinds.iter().map(|k| k.to_string()).collect();
    println!(
        "  Kinds:       {}",
        if kinds.is_empty() { "unknown".to_string() } else { kinds.join(", ") }
    );
    println!(
        "  Marker file: {} ({})",
        ws.settings.scan.marker_file,
        if facts.has_marker_file { "present" } else { "missing" }
    );

    println!("\nPatterns ({} total):", facts.total_patterns);
    if facts.pattern_counts.is_empty() {
        println!("  (none in {}/)", ws.settings.scan.patterns_dir);
    }
    for (category, count) in &facts.pattern_counts {
        println!("  {:<20} {}", category, count);
    }

    println!("\nTracked files:");
    for (file, present) in &facts.tracked_files {
        println!("  {} {}", if *present { "✓" } else { "✗" }, file);
    }

    println!("\nCache:");
    println!("  File:    {}", cache.cache_path().display());
    println!("  Expiry:  {}s", cache.expiry().as_secs());
    println!(
        "  Source:  {}",
        if scanned { "fresh scan" } else { "cached record" }
    );
    if let Some(record) = cache.record() {
        let age = session_keeper_lib::cache::epoch_now() - record.created_at;
        println!("  Age:     {:.0}s", age.max(0.0));
    }
    println!("{}", "=".repeat(60));

    Ok(())
}

fn handle_invalidate() -> anyhow::Result<()> {
    let ws = Workspace::detect()?;
    let mut cache = ws.cache();
    cache.invalidate();
    println!("✓ Cache cleared. Next command will rescan.");
    Ok(())
}

fn handle_trigger(args: &[String]) -> anyhow::Result<()> {
    if args.is_empty() {
        eprintln!("Error: No text provided");
        return Ok(());
    }

    let ws = Workspace::detect()?;
    let detector = TriggerDetector::with_rules(&ws.settings.triggers);
    let result = detector.detect(&args.join(" "));

    match result.label {
        Some(action) => println!("matched: {}", action),
        None => println!("no trigger"),
    }

    Ok(())
}

// Detect a trigger phrase and act on it. Silent when nothing matches, so
// it can sit in a prompt hook.
fn handle_hook(args: &[String]) -> anyhow::Result<()> {
    let text = args.join(" ");
    if text.trim().is_empty() {
        return Ok(());
    }

    let ws = Workspace::detect()?;
    let detector = TriggerDetector::with_rules(&ws.settings.triggers);
    let Some(action) = detector.detect(&text).label else {
        return Ok(());
    };

    let sessions = ws.sessions();
    let outcome = match action {
        TriggerAction::Checkpoint => sessions
            .checkpoint(&text)
            .map(|cp| format!("✓ Checkpoint {} saved", cp.number)),
        TriggerAction::Pause => sessions
            .pause(Some(&text))
            .map(|cp| format!("✓ Session paused (checkpoint {})", cp.number)),
        TriggerAction::Resume => sessions.resume().map(|state| match state.last_checkpoint() {
            Some(cp) => format!("✓ Resumed session {}. Last checkpoint: {}", state.id, cp.note),
            None => format!("✓ Resumed session {}", state.id),
        }),
        TriggerAction::Handoff => sessions
            .handoff(&text, &[])
            .map(|path| format!("✓ Handoff written to {}", path.display())),
    };

    match outcome {
        Ok(message) => println!("{}", message),
        Err(e) => eprintln!("✗ {} trigger ignored: {}", action, e.user_message()),
    }

    Ok(())
}

fn handle_backup(args: &[String]) -> anyhow::Result<()> {
    let Some(name) = args.first() else {
        eprintln!("Error: Usage: session-keeper backup <name> [reason]");
        return Ok(());
    };
    let reason = args[1..].join(" ");

    let ws = Workspace::detect()?;
    let manager = BackupManager::new(ws.root.clone(), &ws.settings);

    match manager.create(name, &reason) {
        Ok(report) => {
            println!("✓ Backup created: {}", report.directory);
            for file in &report.files {
                println!("  {} ({} bytes, sha256 {})", file.path, file.size, &file.sha256[..12]);
            }
            for skipped in &report.skipped {
                println!("  (skipped {}: not found)", skipped);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Backup failed: {}", e.user_message());
            Err(e.into())
        }
    }
}

fn handle_backups() -> anyhow::Result<()> {
    let ws = Workspace::detect()?;
    let manager = BackupManager::new(ws.root.clone(), &ws.settings);
    let names = manager.list()?;

    if names.is_empty() {
        println!("No backups yet.");
        return Ok(());
    }

    println!("\nBackups in {}:", manager.backup_dir().display());
    println!("{}", "=".repeat(60));
    for (i, name) in names.iter().enumerate() {
        match manager.manifest(name) {
            Ok(manifest) if !manifest.reason.is_empty() => {
                println!("{:3}. {} - {}", i + 1, name, manifest.reason)
            }
            _ => println!("{:3}. {}", i + 1, name),
        }
    }
    println!("{}", "=".repeat(60));

    Ok(())
}

fn handle_session(args: &[String]) -> anyhow::Result<()> {
    let ws = Workspace::detect()?;
    let sessions = ws.sessions();

    let sub = args.first().map(String::as_str).unwrap_or("show");
    let rest = if args.is_empty() { &args[..] } else { &args[1..] };

    let result: session_keeper_lib::Result<()> = match sub {
        "start" => {
            let goal = rest.join(" ");
            sessions.start(Some(&goal)).map(|state| {
                println!("✓ Session {} started", state.id);
                if let Some(git) = &state.git {
                    println!("  git: {}", git);
                }
            })
        }
        "checkpoint" => sessions.checkpoint(&rest.join(" ")).map(|cp| {
            println!("✓ Checkpoint {} saved ({})", cp.number, cp.file);
        }),
        "pause" => {
            let note = rest.join(" ");
            sessions.pause(Some(&note)).map(|cp| {
                println!("✓ Session paused at checkpoint {}", cp.number);
            })
        }
        "resume" => sessions.resume().map(|state| {
            println!("✓ Session {} is active", state.id);
            if let Some(cp) = state.last_checkpoint() {
                println!("  Last checkpoint: {}", cp.note);
            }
        }),
        "handoff" => {
            let (summary, next_steps) = split_next_steps(rest);
            sessions.handoff(&summary, &next_steps).map(|path| {
                println!("✓ Handoff written to {}", path.display());
            })
        }
        "history" => sessions.history().map(|ids| {
            if ids.is_empty() {
                println!("No finished sessions yet.");
            }
            for id in ids {
                println!("  {}", id);
            }
        }),
        "show" => sessions.current().map(|current| match current {
            Some(state) => {
                println!("\nSession {}", state.id);
                println!("{}", "=".repeat(60));
                println!("  Status:      {}", state.status);
                println!("  Goal:        {}", state.goal.as_deref().unwrap_or("-"));
                println!(
                    "  Running:     {} min",
                    state.duration_minutes(chrono::Utc::now())
                );
                println!("  Checkpoints: {}", state.checkpoints.len());
                for cp in &state.checkpoints {
                    println!("    {}. {}", cp.number, cp.note);
                }
                println!("{}", "=".repeat(60));
            }
            None => println!("No session yet. Start one with 'session-keeper session start'."),
        }),
        other => Err(KeeperError::InvalidInput(format!(
            "Unknown session command: {}",
            other
        ))),
    };

    if let Err(e) = result {
        eprintln!("✗ {}", e.user_message());
    }

    Ok(())
}

// "handoff <summary words...> --next <step> --next <step>"
fn split_next_steps(args: &[String]) -> (String, Vec<String>) {
    let mut summary = Vec::new();
    let mut next_steps = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--next" => {
                i += 1;
                if i < args.len() {
                    next_steps.push(args[i].clone());
                }
            }
            word => summary.push(word.to_string()),
        }
        i += 1;
    }

    (summary.join(" "), next_steps)
}

fn print_usage() {
    println!(
        r#"session-keeper v{} - Pick up exactly where you left off

USAGE:
    session-keeper <COMMAND> [OPTIONS]

COMMANDS:
    status                       One-line project and session summary
    scan [--force]               Show project facts (--force rescans)
    invalidate                   Clear the project cache
    trigger <text>               Check text for a trigger phrase
    hook <text>                  Detect a trigger phrase and act on it
    backup <name> [reason]       Back up instruction and status files
    backups                      List backups
    session start [goal]         Start a session
    session checkpoint <note>    Save a checkpoint
    session pause [note]         Checkpoint and pause
    session resume               Resume a paused session
    session handoff <summary> [--next <step>]...
                                 Write the handoff document
    session show                 Show the current session
    session history              List finished sessions
    version                      Show version
    help                         Show this help

EXAMPLES:
    session-keeper status
    session-keeper session start "finish the parser"
    session-keeper hook "ok let's pause here"
    session-keeper backup before-refactor "rewriting AGENTS.md"

LOGGING:
    Set RUST_LOG=debug to see cache decisions.
"#,
        env!("CARGO_PKG_VERSION")
    );
}
