//! Wiring between [`tracing`] events, the terminal, and the log file.
use std::fs;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Target rendered as a stage heading.
pub(super) const STAGE_TARGET: &str = "microdots::stage";
/// Target rendered with the dry-run tag.
pub(super) const DRY_RUN_TARGET: &str = "microdots::dry_run";

/// Pulls the formatted `message` field out of an event.
#[derive(Default)]
struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.0 = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

fn event_message(event: &tracing::Event<'_>) -> String {
    let mut visitor = MessageVisitor::default();
    event.record(&mut visitor);
    visitor.0
}

/// Appends every event to `$XDG_CACHE_HOME/microdots/<command>.log`.
///
/// The file always carries the full DEBUG stream with escape codes
/// stripped, whatever the console threshold, so a run can be inspected
/// after the fact without `--verbose`.  Construction truncates the
/// previous run's file and writes a one-line header.
#[derive(Debug)]
pub(super) struct FileMirror {
    sink: Mutex<fs::File>,
}

impl FileMirror {
    /// Returns `None` when the cache directory cannot be prepared.
    pub(super) fn new(command: &str) -> Option<Self> {
        let path = log_file_path(command)?;
        let version =
            option_env!("MICRODOTS_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let stamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S");
        let mut sink = fs::File::create(&path).ok()?;
        writeln!(sink, "dots {command} {version} at {stamp} UTC").ok()?;
        Some(Self {
            sink: Mutex::new(sink),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileMirror {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let meta = event.metadata();
        let level = *meta.level();
        let message = strip_ansi(&event_message(event));
        let clock = chrono::Utc::now().format("%H:%M:%S");

        let tag = if level == tracing::Level::ERROR {
            "error"
        } else if level == tracing::Level::WARN {
            "warn "
        } else if level == tracing::Level::DEBUG {
            "debug"
        } else if meta.target() == STAGE_TARGET {
            "stage"
        } else if meta.target() == DRY_RUN_TARGET {
            "dry  "
        } else {
            "     "
        };

        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(sink, "{clock} {tag} {message}").ok();
    }
}

/// Renders events for the terminal.
///
/// Stage headings get a bold cyan `::` marker, warnings and errors use
/// compiler-style prefixes, and everything else indents under the current
/// stage.
struct ConsoleFormat;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormat
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let level = *meta.level();
        let message = event_message(event);

        if level == tracing::Level::ERROR {
            writeln!(writer, "\x1b[1;31merror:\x1b[0m {message}")
        } else if level == tracing::Level::WARN {
            writeln!(writer, "\x1b[1;33mwarning:\x1b[0m {message}")
        } else if level == tracing::Level::INFO && meta.target() == STAGE_TARGET {
            writeln!(writer, "\x1b[1;36m::\x1b[0m \x1b[1m{message}\x1b[0m")
        } else if level == tracing::Level::INFO && meta.target() == DRY_RUN_TARGET {
            writeln!(writer, "   \x1b[36m[dry-run]\x1b[0m {message}")
        } else if level == tracing::Level::INFO {
            writeln!(writer, "   {message}")
        } else {
            writeln!(writer, "   \x1b[2m{message}\x1b[0m")
        }
    }
}

/// Install the process-wide subscriber: console rendering plus the file
/// mirror.
///
/// `verbose` lifts the console threshold to DEBUG; the file mirror always
/// receives DEBUG.  Warnings and errors go to stderr, the rest to stdout.
/// Call once at startup, before the first event.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;
    use tracing_subscriber::{Layer as _, filter::LevelFilter};

    let threshold = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let split = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(std::io::stdout.with_min_level(tracing::Level::INFO));
    let console = tracing_subscriber::fmt::layer()
        .event_format(ConsoleFormat)
        .with_writer(split)
        .with_filter(threshold);
    let mirror = FileMirror::new(command).map(|layer| layer.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console)
        .with(mirror)
        .init();
}

/// Per-command log file under the microdots cache directory.
///
/// `$XDG_CACHE_HOME/microdots/` when the variable is set and non-empty,
/// `~/.cache/microdots/` otherwise.  Returns `None`, disabling file
/// logging, when the directory cannot be created or `HOME` is unset.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    let base = match std::env::var_os("XDG_CACHE_HOME") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(std::env::var_os("HOME")?).join(".cache"),
    };
    let dir = base.join("microdots");
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join(format!("{command}.log")))
}

/// Drop ANSI escape sequences so the log file stays plain text.
///
/// CSI sequences are skipped through their final byte in `@..~`; any
/// other escape loses the single byte after `ESC`.
pub(super) fn strip_ansi(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\x1b' {
            plain.push(ch);
            continue;
        }
        if chars.next() == Some('[') {
            let _ = chars.by_ref().find(|&c| ('@'..='~').contains(&c));
        }
    }
    plain
}
