//! Typed errors for the microdots engine, built on [`thiserror`].
//!
//! Each engine module owns a small error enum ([`ConfigError`],
//! [`ResolveError`], [`LinkError`], [`InstallError`]); command handlers
//! bubble them into [`anyhow::Error`] with `?` at the CLI boundary.
//! [`TasksFailed`] stands apart: it is not a malfunction but the signal
//! that a run finished with recorded failures, and `main` maps it to its
//! own exit code.
//!
//! Recoverable per-item problems (a conflicting file, a permission error on
//! one destination) are not errors at all: they are recorded in the report
//! types and the batch continues.  Only conditions that abort a whole command
//! surface through these types.

use thiserror::Error;

/// A command ran to completion, but one or more tasks recorded failures.
///
/// Raised after the summary prints so the user has already seen which tasks
/// failed.  Maps to exit code 1, distinct from fatal errors which exit 2.
#[derive(Error, Debug)]
#[error("{count} task(s) failed")]
pub struct TasksFailed {
    /// Number of tasks that recorded a failure.
    pub count: usize,
}

/// Errors that arise from root discovery and `dotfiles.conf` loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No dotfiles repository could be located.
    #[error("No dotfiles repository found (searched {searched})")]
    RootNotFound {
        /// Human-readable list of the locations probed.
        searched: String,
    },

    /// An explicitly given root does not look like a dotfiles repository.
    #[error("Not a dotfiles repository: {path} (missing core/)")]
    InvalidRoot {
        /// The rejected root path.
        path: String,
    },
}

/// Errors from side operations of local layer resolution.
///
/// Resolution itself never fails: a probe error means "that candidate does
/// not exist" and the search moves on.  Only explicit mutations like
/// creating the default directory can error.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Creating the default local directory failed.
    #[error("Failed to create local directory {path}: {source}")]
    Create {
        /// Directory that could not be created.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that abort the symlink engine.
#[derive(Error, Debug)]
pub enum LinkError {
    /// The target home directory does not exist.
    #[error("Home directory does not exist: {0}")]
    HomeMissing(String),

    /// A directory listing required for the whole batch could not be read.
    #[error("Failed to read directory {path}: {source}")]
    Scan {
        /// The unreadable directory.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that abort installer orchestration.
///
/// Individual script failures are recorded in the report, not raised here.
#[derive(Error, Debug)]
pub enum InstallError {
    /// A directory listing required to find scripts could not be read.
    #[error("Failed to read directory {path}: {source}")]
    Scan {
        /// The unreadable directory.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
