//! Top-level subcommand orchestration.
pub mod completions;
pub mod install;
pub mod relink;
pub mod repair;
pub mod status;
pub mod version;

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::config::{self, Config};
use crate::error::TasksFailed;
use crate::logging::{Log, Logger};
use crate::resolve::LocalResolver;

/// Everything a command needs before it can do real work.
///
/// Built once per invocation: repository discovery and `dotfiles.conf`
/// loading happen here so the subcommands start from the same footing.
#[derive(Debug)]
pub struct CommandContext {
    /// Effective configuration for this invocation.
    pub config: Config,
}

impl CommandContext {
    /// Locate the repository and load its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no repository can be found or the home directory
    /// cannot be determined.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        log.stage("Locating repository");
        let root = config::resolve_root(global.root.as_deref())?;
        let config = Config::load(&root)?;
        log.info(&format!("repository: {}", config.root.display()));
        log.debug(&format!("home: {}", config.home.display()));
        if let Some(path) = &config.settings.dotlocal {
            log.debug(&format!("dotfiles.conf DOTLOCAL: {}", path.display()));
        }
        if let Some(path) = &config.settings.backup_path {
            log.debug(&format!("dotfiles.conf BACKUP_PATH: {}", path.display()));
        }
        if global.dry_run {
            log.info("dry run: no changes will be made");
        }
        Ok(Self { config })
    }

    /// Build a local layer resolver rooted at this repository.
    #[must_use]
    pub fn resolver(&self) -> LocalResolver {
        LocalResolver::new(&self.config.root, &self.config.home)
    }
}

/// Print the run summary and bail if any task recorded a failure.
///
/// # Errors
///
/// Returns [`TasksFailed`] if one or more tasks recorded a failure.
pub fn finish(log: &Logger) -> Result<()> {
    log.print_summary();

    let count = log.failure_count();
    if count > 0 {
        return Err(TasksFailed { count }.into());
    }
    Ok(())
}
