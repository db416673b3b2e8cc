//! The one primitive that mutates symlinks.
//!
//! Every link the tool creates, in every phase and in the infrastructure
//! set, goes through [`replace_link`].  Force handling, backups, and
//! dry-run short-circuiting live here and nowhere else.

use anyhow::{Context as _, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::LinkOptions;

/// What [`replace_link`] did, or would have done under dry-run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// A new symlink where nothing existed.
    Created,
    /// An existing entry was replaced; `backup` is where a non-symlink
    /// occupant was moved.
    Replaced {
        /// Backup location for a displaced regular file or directory.
        backup: Option<PathBuf>,
    },
    /// The destination already points at the source.
    Unchanged,
    /// A regular file or directory occupies the destination and `force`
    /// is off.  Nothing was touched.
    Conflict,
    /// The mutation failed; the destination may be in either state.
    Failed(String),
}

/// Point `dest` at `source`, replacing whatever is there.
///
/// Policy, applied in order:
/// - empty destination: link it
/// - symlink (correct): leave it
/// - symlink (anything else, including dangling): relink, no `force` needed
/// - regular file or directory: conflict unless `force`, which moves the
///   occupant to a timestamped backup first
///
/// Backups land next to the destination, or under `backup_dir` when set.
/// Under dry-run the classification runs in full but nothing is touched.
/// Failures are returned as an outcome, never an `Err`; one bad
/// destination must not stop a batch.
pub fn replace_link(
    source: &Path,
    dest: &Path,
    backup_dir: Option<&Path>,
    opts: LinkOptions,
) -> LinkOutcome {
    match fs::symlink_metadata(dest) {
        Err(_) => {
            if opts.dry_run {
                return LinkOutcome::Created;
            }
            match create_symlink(source, dest) {
                Ok(()) => LinkOutcome::Created,
                Err(e) => LinkOutcome::Failed(format!("{e:#}")),
            }
        }
        Ok(meta) if meta.is_symlink() => {
            if fs::read_link(dest).is_ok_and(|existing| existing == source) {
                return LinkOutcome::Unchanged;
            }
            if opts.dry_run {
                return LinkOutcome::Replaced { backup: None };
            }
            match relink(source, dest) {
                Ok(()) => LinkOutcome::Replaced { backup: None },
                Err(e) => LinkOutcome::Failed(format!("{e:#}")),
            }
        }
        Ok(_) => {
            if !opts.force {
                return LinkOutcome::Conflict;
            }
            let backup = backup_destination(dest, backup_dir);
            if opts.dry_run {
                return LinkOutcome::Replaced {
                    backup: Some(backup),
                };
            }
            match displace(dest, &backup).and_then(|()| create_symlink(source, dest)) {
                Ok(()) => LinkOutcome::Replaced {
                    backup: Some(backup),
                },
                Err(e) => LinkOutcome::Failed(format!("{e:#}")),
            }
        }
    }
}

/// Remove the symlink at `dest` and link it to `source`.
fn relink(source: &Path, dest: &Path) -> Result<()> {
    remove_entry(dest).with_context(|| format!("remove existing: {}", dest.display()))?;
    create_symlink(source, dest)
}

/// Where a displaced occupant of `dest` goes: `<name>.backup.<unix-ts>`,
/// next to the destination unless a backup directory is configured.
fn backup_destination(dest: &Path, backup_dir: Option<&Path>) -> PathBuf {
    let name = dest
        .file_name()
        .map_or_else(|| "backup".to_string(), |n| n.to_string_lossy().into_owned());
    let file = format!("{name}.backup.{}", chrono::Utc::now().timestamp());
    backup_dir
        .unwrap_or_else(|| dest.parent().unwrap_or_else(|| Path::new(".")))
        .join(file)
}

/// Move the occupant of `dest` to `backup`, creating the backup's parent
/// directory if needed.
fn displace(dest: &Path, backup: &Path) -> Result<()> {
    if let Some(parent) = backup.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create backup directory: {}", parent.display()))?;
    }
    fs::rename(dest, backup)
        .with_context(|| format!("back up {} to {}", dest.display(), backup.display()))
}

/// Create a symlink at `dest` pointing to `source`.
fn create_symlink(source: &Path, dest: &Path) -> Result<()> {
    std::os::unix::fs::symlink(source, dest).with_context(|| {
        format!(
            "creating symlink {} -> {}",
            dest.display(),
            source.display()
        )
    })
}

/// Remove a symlink regardless of what it points at.
///
/// `remove_file` unlinks symlinks on unix even when they point at a
/// directory.  If the entry stopped being a symlink since classification,
/// this fails with `EISDIR` instead of deleting real data.
fn remove_entry(path: &Path) -> Result<()> {
    fs::remove_file(path).with_context(|| format!("removing link: {}", path.display()))
}
