//! Console and file logging for the command layer.
//!
//! Output flows through [`tracing`]: commands and engines emit events
//! through the [`Log`] trait, a console layer renders them for the
//! terminal, and a [`FileMirror`](sink::FileMirror) appends every event to
//! a per-command file under `$XDG_CACHE_HOME/microdots/`.  Engines take
//! `&dyn Log`, so tests can drive them with a logger that has no
//! subscriber installed and inspect the recorded tasks instead.

mod logger;
mod sink;

pub use logger::Logger;
pub use sink::init_subscriber;

/// Result of one unit of command work, kept for the end-of-run summary.
#[derive(Debug, Clone)]
pub struct TaskEntry {
    /// What ran, as shown in the summary.
    pub name: String,
    /// How it ended.
    pub status: TaskStatus,
    /// Detail appended in parentheses, such as a skip reason.
    pub message: Option<String>,
}

/// How a unit of command work ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Completed and changed (or verified) something.
    Ok,
    /// Nothing for this task to act on in this run.
    NotApplicable,
    /// Deliberately not run, with the reason recorded.
    Skipped,
    /// Previewed only; the run was a dry run.
    DryRun,
    /// Recorded an error; the command will exit nonzero.
    Failed,
}

impl TaskStatus {
    /// Marker shown before the task name in the summary.
    pub(crate) const fn glyph(self) -> &'static str {
        match self {
            Self::Ok => "✓",
            Self::NotApplicable => "-",
            Self::Skipped => "»",
            Self::DryRun => "≈",
            Self::Failed => "✗",
        }
    }

    /// ANSI color for summary lines with this status.
    pub(crate) const fn tint(self) -> &'static str {
        match self {
            Self::Ok => "\x1b[32m",
            Self::NotApplicable => "\x1b[2m",
            Self::Skipped => "\x1b[33m",
            Self::DryRun => "\x1b[36m",
            Self::Failed => "\x1b[31m",
        }
    }

    /// Noun used in the closing tally line.
    pub(crate) const fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotApplicable => "n/a",
            Self::Skipped => "skipped",
            Self::DryRun => "dry-run",
            Self::Failed => "failed",
        }
    }
}

/// Event sink shared by commands and engines.
///
/// [`Logger`] is the production implementation.  Linking and install code
/// accept `&dyn Log` so their batch semantics stay testable without
/// installing a global subscriber.
pub trait Log: Send + Sync {
    /// Announce a major section of the run.
    fn stage(&self, msg: &str);
    /// Normal progress output.
    fn info(&self, msg: &str);
    /// Detail shown with `--verbose`; always lands in the log file.
    fn debug(&self, msg: &str);
    /// Something is off, but the run continues.
    fn warn(&self, msg: &str);
    /// Something broke.
    fn error(&self, msg: &str);
    /// An action a real run would have taken.
    fn dry_run(&self, msg: &str);
    /// Keep a task outcome for the end-of-run summary.
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>);
}

/// Serializes environment-variable mutation across the test binary.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// A [`Logger`] whose file mirror lives in a fresh temp directory, plus
/// the subscriber guard routing this thread's events into it.
///
/// Keep all three values alive for the whole test; dropping the guard
/// restores the previous dispatcher.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn sandboxed_logger() -> (Logger, tempfile::TempDir, tracing::dispatcher::DefaultGuard) {
    use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};

    let tmp = tempfile::tempdir().expect("tempdir");
    let mirror;
    let log;
    {
        let _env = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // SAFETY: no other env access while ENV_LOCK is held; the
        // variable is restored before the lock is released.
        #[allow(unsafe_code)]
        unsafe {
            std::env::set_var("XDG_CACHE_HOME", tmp.path());
        }
        mirror = sink::FileMirror::new("test").expect("file mirror");
        log = Logger::new("test");
        // SAFETY: as above.
        #[allow(unsafe_code)]
        unsafe {
            std::env::remove_var("XDG_CACHE_HOME");
        }
    }
    let registry = tracing_subscriber::registry().with(mirror.with_filter(LevelFilter::DEBUG));
    let guard = tracing::dispatcher::set_default(&tracing::Dispatch::new(registry));
    (log, tmp, guard)
}
