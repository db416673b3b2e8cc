//! Topic discovery and the filename convention table.
//!
//! A topic is one immediate subdirectory of the public or local root,
//! holding the configuration for a single domain (`vim/`, `git/`, ...).
//! Topics are never persisted or cached; every operation re-scans the
//! filesystem so edits between invocations are always picked up.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Infrastructure directories at the repository root that are never
/// topics.
const RESERVED_DIRS: [&str; 3] = ["core", "bin", "docs"];

/// One topic directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    /// Directory basename.
    pub name: String,
    /// Absolute path to the topic directory.
    pub path: PathBuf,
}

/// What a file inside a topic is for, per the naming conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `path.zsh`, sourced first during shell startup to extend `$PATH`.
    Path,
    /// `completion.zsh`, sourced after `compinit`.
    Completion,
    /// `install.sh`, executed by the installer, never sourced.
    Install,
    /// `*.symlink`, linked into the home directory as `.<name>`.
    Symlink,
    /// Any other `*.zsh`, sourced during regular shell startup.
    Config,
}

/// A filename pattern in the convention table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pattern {
    Exact(&'static str),
    Suffix(&'static str),
}

impl Pattern {
    fn matches(self, name: &str) -> bool {
        match self {
            Self::Exact(exact) => name == exact,
            // A bare ".symlink" has no stem to derive a destination from.
            Self::Suffix(suffix) => name.len() > suffix.len() && name.ends_with(suffix),
        }
    }
}

/// The filename convention table, consulted first-match.
///
/// Order matters: `path.zsh` and `completion.zsh` must classify as their
/// specific kinds before the general `*.zsh` suffix gets a chance.
const CONVENTIONS: [(Pattern, FileKind); 5] = [
    (Pattern::Exact("path.zsh"), FileKind::Path),
    (Pattern::Exact("completion.zsh"), FileKind::Completion),
    (Pattern::Exact("install.sh"), FileKind::Install),
    (Pattern::Suffix(".symlink"), FileKind::Symlink),
    (Pattern::Suffix(".zsh"), FileKind::Config),
];

/// Classify a filename against the convention table.
#[must_use]
pub fn classify(name: &str) -> Option<FileKind> {
    CONVENTIONS
        .iter()
        .find(|(pattern, _)| pattern.matches(name))
        .map(|&(_, kind)| kind)
}

/// List the topics under `root`, lexicographic by name.
///
/// Hidden directories (which covers `.git` and the `.dotlocal` marker)
/// and the reserved infrastructure names are excluded.  Plain files at
/// the root are not topics.
pub fn list_topics(root: &Path) -> io::Result<Vec<Topic>> {
    let mut topics = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || RESERVED_DIRS.contains(&name.as_str()) {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            topics.push(Topic { name, path });
        }
    }
    topics.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(topics)
}

/// Direct children of `topic_dir` that are symlink sources, sorted by
/// filename.  Both files and directories qualify; a directory source
/// becomes a whole-directory symlink.
pub fn symlink_sources(topic_dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut sources: Vec<PathBuf> = fs::read_dir(topic_dir)?
        .collect::<io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| {
            file_name_of(path).is_some_and(|name| classify(name) == Some(FileKind::Symlink))
        })
        .collect();
    sources.sort();
    Ok(sources)
}

/// Install scripts for `topic_dir`: its own `install.sh` plus the
/// `install.sh` of each immediate sub-topic.  Exactly one level of
/// recursion; deeper nesting is never consulted.
pub fn install_scripts(topic_dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut scripts = Vec::new();
    let own = topic_dir.join("install.sh");
    if own.is_file() {
        scripts.push(own);
    }
    let mut subdirs: Vec<PathBuf> = fs::read_dir(topic_dir)?
        .collect::<io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_dir() && file_name_of(path).is_some_and(|name| !name.starts_with('.'))
        })
        .collect();
    subdirs.sort();
    for subdir in subdirs {
        let nested = subdir.join("install.sh");
        if nested.is_file() {
            scripts.push(nested);
        }
    }
    Ok(scripts)
}

fn file_name_of(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}
