//! Restricted parser for the optional `dotfiles.conf` override file.
//!
//! The file historically doubled as a shell fragment that other tooling
//! sourced directly, which meant anything written into it would execute.
//! This parser never does that: it recognizes plain `KEY=value` assignment
//! lines (with optional single or double quotes around the value) and
//! nothing else.  Command substitutions, backticks and chained commands
//! survive only as literal value text, or are skipped as malformed lines.
use std::io;
use std::path::{Path, PathBuf};

/// Keys recognized in `dotfiles.conf`.  `LOCAL_PATH` is the legacy alias
/// for `DOTLOCAL`; when both appear, the last assignment wins, matching
/// how the file behaved when it was sourced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Explicit local layer root (`DOTLOCAL` / `LOCAL_PATH`), tilde-expanded.
    pub dotlocal: Option<PathBuf>,
    /// Directory that receives conflict backups instead of the original's
    /// parent (`BACKUP_PATH`), tilde-expanded.
    pub backup_path: Option<PathBuf>,
    /// Whether the user opted into snapshotting before mutations
    /// (`AUTO_SNAPSHOT`).  Parsed and reported; acting on it is left to
    /// external tooling.
    pub auto_snapshot: bool,
}

impl Settings {
    /// Load settings from `path`, expanding `~` against `home`.
    ///
    /// A missing file yields defaults.  An unreadable file is folded into
    /// defaults with a warning so that discovery can still produce an
    /// answer.
    #[must_use]
    pub fn load(path: &Path, home: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse_str(&content, home),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                tracing::warn!("could not read {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Parse settings from file content.
    ///
    /// Unknown keys are ignored.  Lines that are not `KEY=value` assignments
    /// are skipped with a warning and never evaluated.
    #[must_use]
    pub fn parse_str(content: &str, home: &Path) -> Self {
        let mut settings = Self::default();

        for (line_num, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = parse_assignment(line) else {
                tracing::warn!(
                    "dotfiles.conf line {}: not a KEY=value assignment, skipped: {line}",
                    line_num + 1
                );
                continue;
            };

            match key {
                "DOTLOCAL" | "LOCAL_PATH" => {
                    settings.dotlocal = non_empty(value).map(|v| expand_tilde(v, home));
                }
                "BACKUP_PATH" => {
                    settings.backup_path = non_empty(value).map(|v| expand_tilde(v, home));
                }
                "AUTO_SNAPSHOT" => {
                    settings.auto_snapshot = parse_truthy(value, line_num + 1);
                }
                _ => {
                    tracing::debug!("dotfiles.conf: ignoring unknown key {key}");
                }
            }
        }

        settings
    }
}

/// Parse a `KEY=value` line into its key and unquoted value.
///
/// Keys must be non-empty and consist of ASCII alphanumerics and
/// underscores, so `export FOO=x`, backtick lines and similar shellisms
/// fail the key check and are rejected rather than interpreted.
fn parse_assignment(line: &str) -> Option<(&str, &str)> {
    let (key, rest) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return None;
    }
    Some((key, unquote(strip_inline_comment(rest.trim()))))
}

/// Strip one level of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes.first(), bytes.last());
        if (first == Some(&b'\'') && last == Some(&b'\''))
            || (first == Some(&b'"') && last == Some(&b'"'))
        {
            return value.get(1..value.len() - 1).unwrap_or(value);
        }
    }
    value
}

/// Strip inline comments (`#` preceded by whitespace) from a value.
fn strip_inline_comment(value: &str) -> &str {
    value
        .find(" #")
        .or_else(|| value.find("\t#"))
        .map_or(value, |idx| value.get(..idx).unwrap_or(value).trim_end())
}

/// Reject empty values so `DOTLOCAL=` means "unset".
fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Expand a leading `~` against the given home directory.
///
/// Only tilde expansion is applied; environment variables in values stay
/// literal, keeping the parser independent of ambient process state.
fn expand_tilde(value: &str, home: &Path) -> PathBuf {
    PathBuf::from(
        shellexpand::tilde_with_context(value, || Some(home.to_string_lossy())).into_owned(),
    )
}

/// Parse a boolean-ish config value, warning on anything unrecognized.
fn parse_truthy(value: &str, line_num: usize) -> bool {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => true,
        "false" | "no" | "0" | "off" | "" => false,
        other => {
            tracing::warn!("dotfiles.conf line {line_num}: unrecognized AUTO_SNAPSHOT value '{other}', assuming off");
            false
        }
    }
}
