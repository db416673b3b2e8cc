//! Runs topic `install.sh` scripts through an [`Executor`].
//!
//! The scripts themselves are opaque: each is spawned as `sh install.sh`
//! with its topic directory as the working directory, and judged only by
//! its exit code.  A failing script is recorded and the walk continues.

use std::path::{Path, PathBuf};

use crate::error::InstallError;
use crate::exec::Executor;
use crate::logging::Log;
use crate::topics;

/// Outcome of one installer pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Scripts that exited zero (or would run, under dry-run).
    pub succeeded: usize,
    /// Scripts that failed to spawn or exited non-zero, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl InstallReport {
    /// One-line rollup for logs and task messages.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} succeeded, {} failed", self.succeeded, self.failed.len())
    }

    /// Whether any script failed.
    #[must_use]
    pub fn has_problems(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Walks topics and executes their installers.
pub struct InstallOrchestrator<'a> {
    executor: &'a dyn Executor,
}

impl std::fmt::Debug for InstallOrchestrator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallOrchestrator")
            .field("executor", &"dyn Executor")
            .finish()
    }
}

impl<'a> InstallOrchestrator<'a> {
    /// Orchestrator spawning through the given executor.
    #[must_use]
    pub const fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    /// Run every installer under the public root, then the local root.
    ///
    /// Enumeration order is the topic order, with each topic's own script
    /// before its sub-topics'.  Under dry-run the scripts are listed but
    /// never spawned.
    pub fn run_all(
        &self,
        public_root: &Path,
        local_root: Option<&Path>,
        log: &dyn Log,
        dry_run: bool,
    ) -> Result<InstallReport, InstallError> {
        let mut report = InstallReport::default();
        self.run_tree(public_root, log, dry_run, &mut report)?;
        if let Some(local_root) = local_root {
            self.run_tree(local_root, log, dry_run, &mut report)?;
        }
        Ok(report)
    }

    fn run_tree(
        &self,
        root: &Path,
        log: &dyn Log,
        dry_run: bool,
        report: &mut InstallReport,
    ) -> Result<(), InstallError> {
        let topics = topics::list_topics(root).map_err(|source| InstallError::Scan {
            path: root.display().to_string(),
            source,
        })?;

        for topic in topics {
            let scripts = match topics::install_scripts(&topic.path) {
                Ok(scripts) => scripts,
                Err(e) => {
                    log.warn(&format!("cannot read topic {}: {e}", topic.name));
                    report.failed.push((topic.path.clone(), e.to_string()));
                    continue;
                }
            };
            for script in scripts {
                if dry_run {
                    log.dry_run(&format!("would run {}", script.display()));
                    report.succeeded += 1;
                    continue;
                }
                let dir = script.parent().unwrap_or(&topic.path);
                match self.executor.run_in(dir, "sh", &["install.sh"]) {
                    Ok(_) => {
                        log.debug(&format!("ran {}", script.display()));
                        report.succeeded += 1;
                    }
                    Err(e) => {
                        log.warn(&format!("installer failed: {}: {e:#}", script.display()));
                        report.failed.push((script, format!("{e:#}")));
                    }
                }
            }
        }
        Ok(())
    }
}
