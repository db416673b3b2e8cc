//! The two-phase symlink engine and the infrastructure link set.
//!
//! Phase 1 links every `*.symlink` source in the public tree into the
//! home directory; phase 2 walks the local tree and replaces any
//! destination it also produces.  Local always wins, public is the
//! baseline.  Both phases, and the infrastructure set, route every
//! mutation through [`link_ops::replace_link`].

pub mod infrastructure;
pub mod link_ops;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::LinkError;
use crate::logging::Log;
use crate::topics;
use link_ops::LinkOutcome;

/// Behavior switches shared by every mutating operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkOptions {
    /// Classify and report, but touch nothing.
    pub dry_run: bool,
    /// Displace regular files and directories to backups instead of
    /// reporting conflicts.
    pub force: bool,
}

/// Outcome of one [`SymlinkEngine::create_all`] run.
///
/// Counts are per destination, not per operation: a link the local phase
/// lays over one the public phase just created in the same run counts
/// once, as created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Destinations that did not exist before the run.
    pub created: usize,
    /// Destinations whose previous occupant was replaced.
    pub updated: usize,
    /// Destinations that were already correct.
    pub skipped: usize,
    /// Destinations occupied by real files, left untouched (no force).
    pub conflicts: Vec<PathBuf>,
    /// Destinations whose mutation failed, with the reason.
    pub errors: Vec<(PathBuf, String)>,
}

impl LinkReport {
    /// Whether any destination was left in an unwanted state.
    #[must_use]
    pub fn has_problems(&self) -> bool {
        !self.conflicts.is_empty() || !self.errors.is_empty()
    }

    /// One-line rollup for logs and task messages.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} created, {} updated, {} skipped, {} conflicts, {} errors",
            self.created,
            self.updated,
            self.skipped,
            self.conflicts.len(),
            self.errors.len()
        )
    }
}

/// Net effect of a run on one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Disposition {
    Created,
    Updated,
    Skipped,
    Conflict,
    Error(String),
}

/// Merges the public and local trees into the home directory.
#[derive(Debug)]
pub struct SymlinkEngine {
    public_root: PathBuf,
    local_root: Option<PathBuf>,
    home: PathBuf,
    backup_dir: Option<PathBuf>,
}

impl SymlinkEngine {
    /// Engine over a public tree, an optional local tree, and the home
    /// directory that receives the links.
    #[must_use]
    pub const fn new(public_root: PathBuf, local_root: Option<PathBuf>, home: PathBuf) -> Self {
        Self {
            public_root,
            local_root,
            home,
            backup_dir: None,
        }
    }

    /// Send forced-replacement backups to a directory instead of leaving
    /// them next to the destination.
    #[must_use]
    pub fn with_backup_dir(mut self, backup_dir: Option<PathBuf>) -> Self {
        self.backup_dir = backup_dir;
        self
    }

    /// Run both phases and report per-destination results.
    ///
    /// A missing home directory is the one fatal condition.  Anything else,
    /// such as a conflicting file or an unreadable topic, is recorded and
    /// the batch continues.
    pub fn create_all(&self, log: &dyn Log, opts: LinkOptions) -> Result<LinkReport, LinkError> {
        if !self.home.is_dir() {
            return Err(LinkError::HomeMissing(self.home.display().to_string()));
        }

        let mut items: BTreeMap<PathBuf, Disposition> = BTreeMap::new();
        self.link_tree(&self.public_root, "public", log, opts, &mut items)?;
        if let Some(local_root) = &self.local_root {
            self.link_tree(local_root, "local", log, opts, &mut items)?;
        }
        Ok(tally(items))
    }

    /// Link every symlink source under `root` into home.
    fn link_tree(
        &self,
        root: &Path,
        layer: &str,
        log: &dyn Log,
        opts: LinkOptions,
        items: &mut BTreeMap<PathBuf, Disposition>,
    ) -> Result<(), LinkError> {
        let topics = topics::list_topics(root).map_err(|source| LinkError::Scan {
            path: root.display().to_string(),
            source,
        })?;

        for topic in topics {
            let sources = match topics::symlink_sources(&topic.path) {
                Ok(sources) => sources,
                Err(e) => {
                    log.warn(&format!("cannot read topic {}: {e}", topic.name));
                    items.insert(topic.path.clone(), Disposition::Error(e.to_string()));
                    continue;
                }
            };
            for source in sources {
                let Some(dest) = self.destination_for(&source) else {
                    continue;
                };
                let outcome =
                    link_ops::replace_link(&source, &dest, self.backup_dir.as_deref(), opts);
                report_outcome(log, layer, &source, &dest, &outcome, opts.dry_run);
                merge(items, dest, &outcome);
            }
        }
        Ok(())
    }

    /// `<home>/.<stem>` for a `<stem>.symlink` source.
    fn destination_for(&self, source: &Path) -> Option<PathBuf> {
        let name = source.file_name()?.to_str()?;
        let stem = name.strip_suffix(".symlink")?;
        if stem.is_empty() {
            return None;
        }
        Some(self.home.join(format!(".{stem}")))
    }

    /// Remove dangling symlinks among home's immediate entries.
    ///
    /// Only symlinks whose target is gone qualify.  A link pointing at
    /// something unexpected but existing is none of our business, and
    /// non-symlink entries are never candidates.
    pub fn clean_broken(&self, log: &dyn Log, dry_run: bool) -> Result<usize, LinkError> {
        let entries = fs::read_dir(&self.home).map_err(|source| LinkError::Scan {
            path: self.home.display().to_string(),
            source,
        })?;

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !fs::symlink_metadata(&path).is_ok_and(|m| m.is_symlink()) {
                continue;
            }
            if !is_dangling(&path) {
                continue;
            }
            if dry_run {
                log.dry_run(&format!("would remove broken link {}", path.display()));
                removed += 1;
            } else {
                match fs::remove_file(&path) {
                    Ok(()) => {
                        log.debug(&format!("removed broken link {}", path.display()));
                        removed += 1;
                    }
                    Err(e) => log.warn(&format!("cannot remove {}: {e}", path.display())),
                }
            }
        }
        Ok(removed)
    }
}

/// A symlink whose target does not exist.
///
/// Only a definite not-found counts.  A target that exists but cannot be
/// examined (permission denied) must not be treated as gone.
fn is_dangling(path: &Path) -> bool {
    matches!(fs::metadata(path), Err(e) if e.kind() == io::ErrorKind::NotFound)
}

/// Fold an outcome into the per-destination map.
///
/// The local phase replacing a link the public phase created in this same
/// run stays `Created`: the destination went from absent to linked, and
/// that is what the user is told.
fn merge(items: &mut BTreeMap<PathBuf, Disposition>, dest: PathBuf, outcome: &LinkOutcome) {
    let next = match outcome {
        LinkOutcome::Created => Disposition::Created,
        LinkOutcome::Replaced { .. } => Disposition::Updated,
        LinkOutcome::Unchanged => Disposition::Skipped,
        LinkOutcome::Conflict => Disposition::Conflict,
        LinkOutcome::Failed(msg) => Disposition::Error(msg.clone()),
    };
    let folded = match (items.get(&dest), next) {
        (Some(Disposition::Created), Disposition::Updated) => Disposition::Created,
        (_, next) => next,
    };
    items.insert(dest, folded);
}

fn tally(items: BTreeMap<PathBuf, Disposition>) -> LinkReport {
    let mut report = LinkReport::default();
    for (dest, disposition) in items {
        match disposition {
            Disposition::Created => report.created += 1,
            Disposition::Updated => report.updated += 1,
            Disposition::Skipped => report.skipped += 1,
            Disposition::Conflict => report.conflicts.push(dest),
            Disposition::Error(msg) => report.errors.push((dest, msg)),
        }
    }
    report
}

fn report_outcome(
    log: &dyn Log,
    layer: &str,
    source: &Path,
    dest: &Path,
    outcome: &LinkOutcome,
    dry_run: bool,
) {
    match outcome {
        LinkOutcome::Created | LinkOutcome::Replaced { backup: None } if dry_run => {
            log.dry_run(&format!(
                "would link {} -> {} ({layer})",
                dest.display(),
                source.display()
            ));
        }
        LinkOutcome::Replaced {
            backup: Some(backup),
        } if dry_run => {
            log.dry_run(&format!(
                "would back up {} to {} and link -> {} ({layer})",
                dest.display(),
                backup.display(),
                source.display()
            ));
        }
        LinkOutcome::Created | LinkOutcome::Replaced { backup: None } => {
            log.debug(&format!(
                "linked {} -> {} ({layer})",
                dest.display(),
                source.display()
            ));
        }
        LinkOutcome::Replaced {
            backup: Some(backup),
        } => {
            log.info(&format!(
                "backed up {} to {}",
                dest.display(),
                backup.display()
            ));
            log.debug(&format!(
                "linked {} -> {} ({layer})",
                dest.display(),
                source.display()
            ));
        }
        LinkOutcome::Unchanged => {
            log.debug(&format!("ok: {} (already linked)", dest.display()));
        }
        LinkOutcome::Conflict => {
            log.warn(&format!(
                "conflict: {} exists and is not a symlink (re-run with --force to back it up)",
                dest.display()
            ));
        }
        LinkOutcome::Failed(msg) => {
            log.warn(&format!("link failed: {}: {msg}", dest.display()));
        }
    }
}
