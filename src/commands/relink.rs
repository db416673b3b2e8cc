//! Relink command: lay every topic's dotfiles into the home directory.
use anyhow::Result;

use crate::cli::{GlobalOpts, RelinkOpts};
use crate::linker::{LinkOptions, SymlinkEngine};
use crate::logging::{Log, Logger, TaskStatus};

/// Run the relink command.
///
/// With `--clean`, dangling home-directory links are removed before any
/// linking happens, so a link whose source was deleted and then restored
/// under a new topic is recreated rather than skipped.
///
/// # Errors
///
/// Returns an error if setup fails, the home directory is missing, a
/// directory scan fails, or any destination recorded a failure.
pub fn run(global: &GlobalOpts, opts: &RelinkOpts, log: &Logger) -> Result<()> {
    let ctx = super::CommandContext::init(global, log)?;
    let config = &ctx.config;

    log.stage("Resolving local layer");
    let resolution = ctx.resolver().resolve();
    match &resolution.path {
        Some(path) => log.info(&format!(
            "local layer: {} (via {})",
            path.display(),
            resolution.method
        )),
        None => log.info("no local layer, linking public dotfiles only"),
    }

    let engine = SymlinkEngine::new(
        config.root.clone(),
        resolution.path.clone(),
        config.home.clone(),
    )
    .with_backup_dir(config.settings.backup_path.clone());

    if opts.clean {
        log.stage("Cleaning broken links");
        let removed = engine.clean_broken(log, global.dry_run)?;
        if global.dry_run {
            log.record_task(
                "clean broken links",
                TaskStatus::DryRun,
                Some(&format!("{removed} would be removed")),
            );
        } else {
            log.info(&format!("{removed} broken link(s) removed"));
            log.record_task(
                "clean broken links",
                TaskStatus::Ok,
                Some(&format!("{removed} removed")),
            );
        }
    }

    log.stage("Linking dotfiles");
    let report = engine.create_all(
        log,
        LinkOptions {
            dry_run: global.dry_run,
            force: opts.force,
        },
    )?;
    log.info(&report.summary());

    let status = if report.has_problems() {
        TaskStatus::Failed
    } else if global.dry_run {
        TaskStatus::DryRun
    } else {
        TaskStatus::Ok
    };
    log.record_task("symlinks", status, Some(&report.summary()));

    super::finish(log)
}
