//! The fixed infrastructure link set inside the local layer.
//!
//! Shared tooling from the public repository is mirrored into the local
//! root as symlinks, so private topics use the same helpers and
//! templates without copying them.  The set is fixed; nothing else under
//! the local root is ever touched from here.

use std::fs;
use std::path::PathBuf;

use super::LinkOptions;
use super::link_ops::{self, LinkOutcome};
use crate::logging::Log;

/// `(source under the public root, link name under the local root)`.
const INFRASTRUCTURE: [(&str, &str); 6] = [
    ("core", "core"),
    ("bin", "bin"),
    ("docs", "docs"),
    ("core/functions", "functions"),
    ("core/templates", "templates"),
    ("MICRODOTS.md", "MICRODOTS.md"),
];

/// Outcome of an [`InfrastructureLinker::ensure`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfraReport {
    /// Links that did not exist before.
    pub created: usize,
    /// Links that were wrong and got recreated, or conflicting files
    /// displaced under force.
    pub updated: usize,
    /// Links that were already correct.
    pub unchanged: usize,
    /// Entries that could not be brought into shape, with the reason.
    pub errors: Vec<(PathBuf, String)>,
}

impl InfraReport {
    /// One-line rollup for logs and task messages.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} created, {} updated, {} unchanged, {} errors",
            self.created,
            self.updated,
            self.unchanged,
            self.errors.len()
        )
    }

    /// Whether any entry was left defective.
    #[must_use]
    pub fn has_problems(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// One defective entry found by [`InfrastructureLinker::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defect {
    /// The infrastructure link under the local root.
    pub target: PathBuf,
    /// What is wrong with it.
    pub problem: String,
}

/// Maintains the infrastructure links inside a resolved local root.
#[derive(Debug)]
pub struct InfrastructureLinker {
    public_root: PathBuf,
    local_root: PathBuf,
    backup_dir: Option<PathBuf>,
}

impl InfrastructureLinker {
    /// Linker between a public repository and a resolved local root.
    #[must_use]
    pub const fn new(public_root: PathBuf, local_root: PathBuf) -> Self {
        Self {
            public_root,
            local_root,
            backup_dir: None,
        }
    }

    /// Send forced-replacement backups to a directory instead of leaving
    /// them next to the displaced entry.
    #[must_use]
    pub fn with_backup_dir(mut self, backup_dir: Option<PathBuf>) -> Self {
        self.backup_dir = backup_dir;
        self
    }

    /// Bring every entry into shape.
    ///
    /// Wrong or dangling symlinks are recreated regardless of `force`;
    /// a regular file or directory in the way is an error unless `force`
    /// displaces it to a backup.  An entry whose source is missing from
    /// the public repository is an error, never a dangling link.
    pub fn ensure(&self, log: &dyn Log, opts: LinkOptions) -> InfraReport {
        let mut report = InfraReport::default();
        for (source_rel, name) in INFRASTRUCTURE {
            let source = self.public_root.join(source_rel);
            let target = self.local_root.join(name);

            if fs::symlink_metadata(&source).is_err() {
                log.warn(&format!(
                    "infrastructure source missing: {}",
                    source.display()
                ));
                report
                    .errors
                    .push((target, format!("source missing: {}", source.display())));
                continue;
            }

            match link_ops::replace_link(&source, &target, self.backup_dir.as_deref(), opts) {
                LinkOutcome::Created => {
                    if opts.dry_run {
                        log.dry_run(&format!(
                            "would link {} -> {}",
                            target.display(),
                            source.display()
                        ));
                    } else {
                        log.debug(&format!(
                            "linked {} -> {}",
                            target.display(),
                            source.display()
                        ));
                    }
                    report.created += 1;
                }
                LinkOutcome::Replaced { backup } => {
                    if opts.dry_run {
                        log.dry_run(&format!("would relink {}", target.display()));
                    } else {
                        if let Some(backup) = backup {
                            log.info(&format!(
                                "backed up {} to {}",
                                target.display(),
                                backup.display()
                            ));
                        }
                        log.debug(&format!(
                            "relinked {} -> {}",
                            target.display(),
                            source.display()
                        ));
                    }
                    report.updated += 1;
                }
                LinkOutcome::Unchanged => report.unchanged += 1,
                LinkOutcome::Conflict => {
                    log.warn(&format!(
                        "infrastructure conflict: {} exists and is not a symlink",
                        target.display()
                    ));
                    report
                        .errors
                        .push((target, "exists and is not a symlink".to_string()));
                }
                LinkOutcome::Failed(msg) => {
                    log.warn(&format!("infrastructure link failed: {}: {msg}", target.display()));
                    report.errors.push((target, msg));
                }
            }
        }
        report
    }

    /// Read-only check, same classification rules as [`ensure`](Self::ensure).
    #[must_use]
    pub fn validate(&self) -> Vec<Defect> {
        let mut defects = Vec::new();
        for (source_rel, name) in INFRASTRUCTURE {
            let source = self.public_root.join(source_rel);
            let target = self.local_root.join(name);

            if fs::symlink_metadata(&source).is_err() {
                defects.push(Defect {
                    target,
                    problem: format!("source missing: {}", source.display()),
                });
                continue;
            }
            let problem = match fs::symlink_metadata(&target) {
                Err(_) => Some("missing".to_string()),
                Ok(meta) if meta.is_symlink() => match fs::read_link(&target) {
                    Ok(existing) if existing == source => None,
                    Ok(existing) => Some(format!("points at {}", existing.display())),
                    Err(e) => Some(format!("unreadable link: {e}")),
                },
                Ok(_) => Some("exists and is not a symlink".to_string()),
            };
            if let Some(problem) = problem {
                defects.push(Defect { target, problem });
            }
        }
        defects
    }

    /// Validate, then fix everything fixable.
    ///
    /// Repair always backs up conflicting files rather than reporting
    /// them, so the only errors left afterwards are missing sources and
    /// filesystem failures.
    pub fn repair(&self, log: &dyn Log, dry_run: bool) -> InfraReport {
        self.ensure(
            log,
            LinkOptions {
                dry_run,
                force: true,
            },
        )
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::sandboxed_logger;
    use std::os::unix::fs::symlink;
    use tempfile::{TempDir, tempdir};

    struct Fixture {
        public: TempDir,
        local: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let public = tempdir().unwrap();
            for dir in ["core/functions", "core/templates", "bin", "docs"] {
                fs::create_dir_all(public.path().join(dir)).unwrap();
            }
            fs::write(public.path().join("MICRODOTS.md"), "# conventions").unwrap();
            Self {
                public,
                local: tempdir().unwrap(),
            }
        }

        fn linker(&self) -> InfrastructureLinker {
            InfrastructureLinker::new(
                self.public.path().to_path_buf(),
                self.local.path().to_path_buf(),
            )
        }
    }

    #[test]
    fn ensure_creates_the_whole_set() {
        let fx = Fixture::new();
        let (log, _tmp, _guard) = sandboxed_logger();

        let report = fx.linker().ensure(&log, LinkOptions::default());
        assert_eq!(report.created, 6);
        assert!(report.errors.is_empty());
        assert_eq!(
            fs::read_link(fx.local.path().join("functions")).unwrap(),
            fx.public.path().join("core/functions")
        );
        assert_eq!(
            fs::read_link(fx.local.path().join("MICRODOTS.md")).unwrap(),
            fx.public.path().join("MICRODOTS.md")
        );
    }

    #[test]
    fn ensure_is_idempotent() {
        let fx = Fixture::new();
        let (log, _tmp, _guard) = sandboxed_logger();
        let linker = fx.linker();

        linker.ensure(&log, LinkOptions::default());
        let second = linker.ensure(&log, LinkOptions::default());
        assert_eq!(second.created, 0);
        assert_eq!(second.unchanged, 6);
    }

    #[test]
    fn wrong_link_is_recreated_without_force() {
        let fx = Fixture::new();
        let (log, _tmp, _guard) = sandboxed_logger();
        symlink(fx.public.path().join("docs"), fx.local.path().join("core")).unwrap();

        let report = fx.linker().ensure(&log, LinkOptions::default());
        assert_eq!(report.updated, 1);
        assert_eq!(report.created, 5);
        assert_eq!(
            fs::read_link(fx.local.path().join("core")).unwrap(),
            fx.public.path().join("core")
        );
    }

    #[test]
    fn conflicting_file_is_an_error_without_force() {
        let fx = Fixture::new();
        let (log, _tmp, _guard) = sandboxed_logger();
        fs::write(fx.local.path().join("bin"), "my own bin").unwrap();

        let report = fx.linker().ensure(&log, LinkOptions::default());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(
            fs::read_to_string(fx.local.path().join("bin")).unwrap(),
            "my own bin"
        );
    }

    #[test]
    fn repair_backs_up_the_conflict() {
        let fx = Fixture::new();
        let (log, _tmp, _guard) = sandboxed_logger();
        fs::write(fx.local.path().join("bin"), "my own bin").unwrap();

        let report = fx.linker().repair(&log, false);
        assert!(report.errors.is_empty());
        assert!(
            fs::symlink_metadata(fx.local.path().join("bin"))
                .unwrap()
                .is_symlink()
        );
        let backup = fs::read_dir(fx.local.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .find(|name| name.starts_with("bin.backup."))
            .expect("backup should exist");
        assert_eq!(
            fs::read_to_string(fx.local.path().join(backup)).unwrap(),
            "my own bin"
        );
    }

    #[test]
    fn missing_source_is_an_error_not_a_dangling_link() {
        let fx = Fixture::new();
        let (log, _tmp, _guard) = sandboxed_logger();
        fs::remove_file(fx.public.path().join("MICRODOTS.md")).unwrap();

        let report = fx.linker().ensure(&log, LinkOptions::default());
        assert_eq!(report.errors.len(), 1);
        assert!(fs::symlink_metadata(fx.local.path().join("MICRODOTS.md")).is_err());
    }

    #[test]
    fn validate_reports_every_missing_entry() {
        let fx = Fixture::new();
        let defects = fx.linker().validate();
        assert_eq!(defects.len(), 6);
        assert!(defects.iter().all(|d| d.problem == "missing"));
    }

    #[test]
    fn validate_is_clean_after_ensure() {
        let fx = Fixture::new();
        let (log, _tmp, _guard) = sandboxed_logger();
        let linker = fx.linker();
        linker.ensure(&log, LinkOptions::default());
        assert!(linker.validate().is_empty());
    }

    #[test]
    fn validate_names_the_wrong_target() {
        let fx = Fixture::new();
        let (log, _tmp, _guard) = sandboxed_logger();
        let linker = fx.linker();
        linker.ensure(&log, LinkOptions::default());

        fs::remove_file(fx.local.path().join("docs")).unwrap();
        symlink(fx.public.path().join("bin"), fx.local.path().join("docs")).unwrap();

        let defects = linker.validate();
        assert_eq!(defects.len(), 1);
        assert!(defects[0].problem.contains("points at"));
    }

    #[test]
    fn validate_does_not_mutate() {
        let fx = Fixture::new();
        let linker = fx.linker();
        linker.validate();
        assert_eq!(fs::read_dir(fx.local.path()).unwrap().count(), 0);
    }

    #[test]
    fn dry_run_ensure_previews_without_linking() {
        let fx = Fixture::new();
        let (log, _tmp, _guard) = sandboxed_logger();

        let report = fx.linker().ensure(
            &log,
            LinkOptions {
                dry_run: true,
                force: false,
            },
        );
        assert_eq!(report.created, 6);
        assert_eq!(fs::read_dir(fx.local.path()).unwrap().count(), 0);
    }

    #[test]
    fn the_link_set_is_fixed() {
        let rendered: Vec<String> = INFRASTRUCTURE
            .iter()
            .map(|(source, name)| format!("{name} -> <public>/{source}"))
            .collect();
        insta::assert_snapshot!(rendered.join("\n"), @r"
        core -> <public>/core
        bin -> <public>/bin
        docs -> <public>/docs
        functions -> <public>/core/functions
        templates -> <public>/core/templates
        MICRODOTS.md -> <public>/MICRODOTS.md
        ");
    }
}
