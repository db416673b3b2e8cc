//! Status command: report the resolved layout, settings, and link health.
//!
//! Everything here is a read.  The only side effect the whole command has is
//! populating the resolver cache, which dies with the process anyway.
use std::io;
use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::{Config, Settings};
use crate::exec::{Executor, SystemExecutor};
use crate::linker::infrastructure::InfrastructureLinker;
use crate::logging::{Log, Logger, TaskStatus};
use crate::resolve::Resolution;
use crate::topics::{self, FileKind};

/// Run the status command.
///
/// Exit code 1 (via recorded check failures) signals broken infrastructure
/// links, so scripts can use `dots status` as a health probe.
///
/// # Errors
///
/// Returns an error if the repository cannot be located or a topic tree
/// cannot be enumerated.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let executor = SystemExecutor;
    let ctx = super::CommandContext::init(global, log)?;
    let config = &ctx.config;

    log.stage("Local layer");
    let resolution = ctx.resolver().resolve();
    report_local_layer(&resolution, log);
    report_settings(&config.settings, log);

    log.stage("Infrastructure");
    check_infrastructure(&config.root, &resolution, log);

    log.stage("Topics");
    let public = tally_tree(&config.root)
        .with_context(|| format!("failed to enumerate {}", config.root.display()))?;
    report_tally("public", &public, log);
    let local = match &resolution.path {
        Some(local_root) => {
            let tally = tally_tree(local_root)
                .with_context(|| format!("failed to enumerate {}", local_root.display()))?;
            report_tally("local", &tally, log);
            tally
        }
        None => TreeTally::default(),
    };
    log.record_task(
        "topics",
        TaskStatus::Ok,
        Some(&format!(
            "{} topics, {} link sources",
            public.topics + local.topics,
            public.links + local.links
        )),
    );

    log.stage("Repository state");
    check_git_state(&executor, config, &resolution, log);

    super::finish(log)
}

/// Report where the local layer was found and which level found it.
fn report_local_layer(resolution: &Resolution, log: &Logger) {
    match &resolution.path {
        Some(path) => {
            log.info(&format!(
                "local layer: {} (via {})",
                path.display(),
                resolution.method
            ));
            log.record_task(
                "local layer",
                TaskStatus::Ok,
                Some(&format!("via {}", resolution.method)),
            );
        }
        None => {
            log.info("local layer: none (public dotfiles only)");
            log.info("run `dots repair-infrastructure` to create one");
            log.record_task("local layer", TaskStatus::NotApplicable, Some("not found"));
        }
    }
}

/// Report the effective `dotfiles.conf` overrides.
fn report_settings(settings: &Settings, log: &Logger) {
    if let Some(path) = &settings.backup_path {
        log.info(&format!("backups: {}", path.display()));
    }
    log.info(&format!(
        "auto snapshot: {}",
        if settings.auto_snapshot { "on" } else { "off" }
    ));
}

/// Validate the infrastructure links without touching anything.
fn check_infrastructure(public_root: &Path, resolution: &Resolution, log: &Logger) {
    let Some(local_root) = &resolution.path else {
        log.info("no local layer, nothing to validate");
        log.record_task("infrastructure", TaskStatus::NotApplicable, None);
        return;
    };

    let linker = InfrastructureLinker::new(public_root.to_path_buf(), local_root.clone());
    let defects = linker.validate();
    if defects.is_empty() {
        log.info("all infrastructure links healthy");
        log.record_task("infrastructure", TaskStatus::Ok, None);
        return;
    }

    for defect in &defects {
        log.warn(&format!("{}: {}", defect.target.display(), defect.problem));
    }
    log.info("run `dots repair-infrastructure` to fix");
    log.record_task(
        "infrastructure",
        TaskStatus::Failed,
        Some(&format!("{} defect(s)", defects.len())),
    );
}

/// Probe both trees for uncommitted changes, when git is available.
fn check_git_state(
    executor: &dyn Executor,
    config: &Config,
    resolution: &Resolution,
    log: &Logger,
) {
    if !executor.which("git") {
        log.debug("git not found, skipping repository probe");
        log.record_task("repository state", TaskStatus::Skipped, Some("git not found"));
        return;
    }

    let trees = [
        ("public", Some(config.root.as_path())),
        ("local", resolution.path.as_deref()),
    ];
    let mut dirty = 0usize;
    for (label, root) in trees {
        let Some(root) = root else { continue };
        if probe_dirty(executor, root, label, log) == Some(true) {
            dirty += 1;
        }
    }

    if dirty > 0 {
        log.record_task(
            "repository state",
            TaskStatus::Ok,
            Some(&format!("{dirty} tree(s) with uncommitted changes")),
        );
    } else {
        log.record_task("repository state", TaskStatus::Ok, None);
    }
}

/// Ask git whether `root` has uncommitted changes.
///
/// Returns `None` when the answer cannot be determined (not a git checkout,
/// probe failed).  Dirty trees are reported but never treated as failures:
/// the repository owner may well be mid-edit.
fn probe_dirty(executor: &dyn Executor, root: &Path, label: &str, log: &Logger) -> Option<bool> {
    let root_str = root.to_str()?;
    match executor.run_unchecked("git", &["-C", root_str, "status", "--porcelain"]) {
        Ok(result) if result.success => {
            let dirty = !result.stdout.trim().is_empty();
            if dirty {
                log.info(&format!("{label}: uncommitted changes"));
            } else {
                log.info(&format!("{label}: clean"));
            }
            Some(dirty)
        }
        Ok(_) => {
            log.debug(&format!("{label}: not a git checkout"));
            None
        }
        Err(e) => {
            log.debug(&format!("{label}: git probe failed: {e:#}"));
            None
        }
    }
}

/// Per-tree counts of topics and the files inside them.
#[derive(Debug, Default, PartialEq, Eq)]
struct TreeTally {
    topics: usize,
    links: usize,
    installers: usize,
    path_fragments: usize,
    completions: usize,
    config_fragments: usize,
}

impl TreeTally {
    fn shell_files(&self) -> usize {
        self.path_fragments + self.completions + self.config_fragments
    }
}

/// Count topics and classify their immediate entries.
///
/// Installer scripts are counted through [`topics::install_scripts`] so
/// one-level sub-topics are included, matching what `install` would run.
fn tally_tree(root: &Path) -> io::Result<TreeTally> {
    let mut tally = TreeTally::default();
    for topic in topics::list_topics(root)? {
        tally.topics += 1;
        tally.installers += topics::install_scripts(&topic.path)?.len();
        for entry in std::fs::read_dir(&topic.path)? {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else { continue };
            match topics::classify(name) {
                Some(FileKind::Symlink) => tally.links += 1,
                Some(FileKind::Path) => tally.path_fragments += 1,
                Some(FileKind::Completion) => tally.completions += 1,
                Some(FileKind::Config) => tally.config_fragments += 1,
                // Counted above, across both levels.
                Some(FileKind::Install) | None => {}
            }
        }
    }
    Ok(tally)
}

fn report_tally(label: &str, tally: &TreeTally, log: &Logger) {
    log.info(&format!(
        "{label}: {} topics, {} link sources, {} installers, {} shell files",
        tally.topics,
        tally.links,
        tally.installers,
        tally.shell_files()
    ));
    log.debug(&format!(
        "{label} shell files: {} path, {} completion, {} plain",
        tally.path_fragments, tally.completions, tally.config_fragments
    ));
}
