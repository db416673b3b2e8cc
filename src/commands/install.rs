//! Install command: run every topic's `install.sh`.
use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::exec::{Executor, SystemExecutor};
use crate::installer::InstallOrchestrator;
use crate::logging::{Log, Logger, TaskStatus};

/// Run the install command.
///
/// Scripts run through `sh` in their own directory, public tree first,
/// then the local tree.  A failing script is recorded and the run
/// continues.
///
/// # Errors
///
/// Returns an error if setup fails, a topic tree cannot be enumerated, or
/// any script recorded a failure.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let executor = SystemExecutor;
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
        None => log.info("no local layer, running public installers only"),
    }

    log.stage("Running installers");
    if !executor.which("sh") {
        log.warn("sh not found on PATH, cannot run installers");
        log.record_task("installers", TaskStatus::Skipped, Some("sh not found"));
        return super::finish(log);
    }

    let orchestrator = InstallOrchestrator::new(&executor);
    let report = orchestrator.run_all(
        &config.root,
        resolution.path.as_deref(),
        log,
        global.dry_run,
    )?;
    log.info(&report.summary());

    let status = if report.has_problems() {
        TaskStatus::Failed
    } else if global.dry_run {
        TaskStatus::DryRun
    } else {
        TaskStatus::Ok
    };
    log.record_task("installers", status, Some(&report.summary()));

    super::finish(log)
}
