//! The [`Logger`]: event emission plus the end-of-run summary.
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use super::sink::{self, DRY_RUN_TARGET, STAGE_TARGET};
use super::{Log, TaskEntry, TaskStatus};

/// Production [`Log`] implementation.
///
/// Display methods forward to [`tracing`], so the layers installed by
/// [`init_subscriber`](super::init_subscriber) decide where the text
/// lands.  Task outcomes accumulate here and come back out through
/// [`print_summary`](Self::print_summary).
#[derive(Debug)]
pub struct Logger {
    entries: Mutex<Vec<TaskEntry>>,
    file: Option<PathBuf>,
}

impl Logger {
    /// Logger for one command invocation.
    ///
    /// `command` picks the log file name.  The file itself is created by
    /// the [`FileMirror`](sink::FileMirror) when the subscriber comes up;
    /// the path is kept here only so the summary can point at it.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            file: sink::log_file_path(command),
        }
    }

    fn entries(&self) -> Vec<TaskEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of tasks that recorded [`TaskStatus::Failed`].
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.entries()
            .iter()
            .filter(|entry| entry.status == TaskStatus::Failed)
            .count()
    }

    /// Whether any task recorded a failure.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }

    /// Emit the per-task summary block.
    ///
    /// One line per recorded task, a tally of the non-empty status
    /// buckets, and the log file location.  Prints nothing when no tasks
    /// were recorded, which keeps `completions` and `version` output
    /// clean for piping.
    pub fn print_summary(&self) {
        let entries = self.entries();
        if entries.is_empty() {
            return;
        }
        self.info("");
        self.stage("Summary");
        let width = terminal_width().saturating_sub(4);
        for line in render_summary(&entries, width) {
            self.info(&line);
        }
        if let Some(path) = &self.file {
            self.info(&format!("\x1b[2mfull log: {}\x1b[0m", path.display()));
        }
    }

    #[cfg(test)]
    pub(crate) fn log_path(&self) -> Option<&PathBuf> {
        self.file.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn recorded(&self) -> Vec<TaskEntry> {
        self.entries()
    }
}

impl Log for Logger {
    fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(TaskEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
    }
}

/// Per-status counters behind the closing tally line.
#[derive(Debug, Default)]
struct Tally {
    ok: usize,
    not_applicable: usize,
    skipped: usize,
    dry_run: usize,
    failed: usize,
}

impl Tally {
    fn bump(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Ok => self.ok += 1,
            TaskStatus::NotApplicable => self.not_applicable += 1,
            TaskStatus::Skipped => self.skipped += 1,
            TaskStatus::DryRun => self.dry_run += 1,
            TaskStatus::Failed => self.failed += 1,
        }
    }

    fn total(&self) -> usize {
        self.ok + self.not_applicable + self.skipped + self.dry_run + self.failed
    }

    /// `"7 tasks: 5 ok, 1 skipped, 1 failed"`, empty buckets omitted.
    fn line(&self) -> String {
        let buckets = [
            (TaskStatus::Ok, self.ok),
            (TaskStatus::NotApplicable, self.not_applicable),
            (TaskStatus::Skipped, self.skipped),
            (TaskStatus::DryRun, self.dry_run),
            (TaskStatus::Failed, self.failed),
        ];
        let parts: Vec<String> = buckets
            .into_iter()
            .filter(|&(_, count)| count > 0)
            .map(|(status, count)| format!("{}{count} {}\x1b[0m", status.tint(), status.label()))
            .collect();
        format!("{} tasks: {}", self.total(), parts.join(", "))
    }
}

/// Render one colored line per task plus the closing tally.
///
/// Pure so the exact output is testable; [`Logger::print_summary`] feeds
/// the lines through [`Log::info`].
fn render_summary(entries: &[TaskEntry], width: usize) -> Vec<String> {
    let mut tally = Tally::default();
    let mut lines = Vec::with_capacity(entries.len() + 2);
    for entry in entries {
        tally.bump(entry.status);
        let detail = entry
            .message
            .as_deref()
            .map(|message| format!(" ({message})"))
            .unwrap_or_default();
        let text = format!("{} {}{detail}", entry.status.glyph(), entry.name);
        lines.push(format!(
            "{}{}\x1b[0m",
            entry.status.tint(),
            ellipsize(&text, width)
        ));
    }
    lines.push(String::new());
    lines.push(tally.line());
    lines
}

/// Shorten `text` to at most `max` characters, ending in `…` when cut.
fn ellipsize(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut kept: String = text.chars().take(max.saturating_sub(1)).collect();
    kept.push('…');
    kept
}

/// Columns available on the attached terminal.
///
/// An explicit `COLUMNS` value wins, then the probed terminal size, then
/// 80 for pipes and CI.
fn terminal_width() -> usize {
    let configured = std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|&columns| columns > 0);
    configured
        .or_else(|| terminal_size::terminal_size().map(|(w, _)| usize::from(w.0)))
        .unwrap_or(80)
}
