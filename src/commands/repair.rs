//! Repair command: recreate the infrastructure links inside the local layer.
use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::linker::infrastructure::InfrastructureLinker;
use crate::logging::{Log, Logger, TaskStatus};

/// Run the repair-infrastructure command.
///
/// When no local layer resolves at all, the default `~/.dotlocal` is
/// created first so there is something to link into.
///
/// # Errors
///
/// Returns an error if setup fails, the default local directory cannot be
/// created, or any infrastructure entry recorded a failure.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let ctx = super::CommandContext::init(global, log)?;
    let config = &ctx.config;

    log.stage("Resolving local layer");
    let mut resolver = ctx.resolver();
    let resolution = resolver.resolve();
    let local_root = match resolution.path {
        Some(path) => {
            log.info(&format!(
                "local layer: {} (via {})",
                path.display(),
                resolution.method
            ));
            path
        }
        None if global.dry_run => {
            let path = resolver.default_local_path();
            log.dry_run(&format!("would create {}", path.display()));
            path
        }
        None => {
            let path = resolver.ensure_default_local()?;
            log.info(&format!("created local layer: {}", path.display()));
            path
        }
    };

    log.stage("Repairing infrastructure");
    let linker = InfrastructureLinker::new(config.root.clone(), local_root)
        .with_backup_dir(config.settings.backup_path.clone());
    let report = linker.repair(log, global.dry_run);
    log.info(&report.summary());

    let status = if report.has_problems() {
        TaskStatus::Failed
    } else if global.dry_run {
        TaskStatus::DryRun
    } else {
        TaskStatus::Ok
    };
    log.record_task("infrastructure", status, Some(&report.summary()));

    super::finish(log)
}
