//! Configuration: repository root discovery and `dotfiles.conf` settings.
//!
//! The repository layout is convention over configuration: the only config
//! file is the optional `dotfiles.conf` at the public root, parsed by
//! [`conf`] with a deliberately restricted grammar.

pub mod conf;

pub use conf::Settings;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::error::ConfigError;

/// Effective configuration for one command invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Public dotfiles repository root.
    pub root: PathBuf,
    /// User home directory (link destination namespace).
    pub home: PathBuf,
    /// Overrides parsed from `<root>/dotfiles.conf`.
    pub settings: Settings,
}

impl Config {
    /// Build the configuration for a discovered repository root.
    ///
    /// # Errors
    ///
    /// Returns an error if the `HOME` environment variable is not set.
    pub fn load(root: &Path) -> Result<Self> {
        let home = home_dir()?;
        let settings = Settings::load(&root.join("dotfiles.conf"), &home);
        Ok(Self {
            root: root.to_path_buf(),
            home,
            settings,
        })
    }
}

/// Return the user's home directory from the environment.
///
/// # Errors
///
/// Returns an error if the `HOME` environment variable is not set.
pub fn home_dir() -> Result<PathBuf> {
    std::env::var("HOME")
        .map(PathBuf::from)
        .map_err(|_| anyhow::anyhow!("HOME environment variable is not set"))
}

/// Resolve the dotfiles repository root.
///
/// Precedence: the `--root` flag, then `MICRODOTS_ROOT` (or the legacy
/// `DOTFILES_ROOT`), then `~/.dotfiles`, then the current directory.  An
/// explicitly named root that does not look like a repository is an error;
/// the fallback locations are probed silently.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidRoot`] for an explicit non-repository path
/// and [`ConfigError::RootNotFound`] when every location comes up empty.
pub fn resolve_root(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(root) = explicit {
        return check_repo(root);
    }

    for var in ["MICRODOTS_ROOT", "DOTFILES_ROOT"] {
        if let Ok(root) = std::env::var(var) {
            return check_repo(Path::new(&root));
        }
    }

    if let Ok(home) = home_dir() {
        let default = home.join(".dotfiles");
        if looks_like_repo(&default) {
            return Ok(default);
        }
    }

    let cwd = std::env::current_dir()?;
    if looks_like_repo(&cwd) {
        return Ok(cwd);
    }

    Err(ConfigError::RootNotFound {
        searched: "--root, $MICRODOTS_ROOT, ~/.dotfiles, current directory".to_string(),
    }
    .into())
}

/// Validate an explicitly named root.
fn check_repo(root: &Path) -> Result<PathBuf> {
    if looks_like_repo(root) {
        Ok(root.to_path_buf())
    } else {
        Err(ConfigError::InvalidRoot {
            path: root.display().to_string(),
        }
        .into())
    }
}

/// A repository root is recognized by its `core/` infrastructure directory.
fn looks_like_repo(path: &Path) -> bool {
    path.join("core").is_dir()
}

#[cfg(test)]
#[allow(unsafe_code)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::logging::ENV_LOCK;

    fn repo_fixture() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(tmp.path().join("core")).expect("mkdir core");
        tmp
    }

    #[test]
    fn resolve_root_honors_explicit_path() {
        let tmp = repo_fixture();
        let result = resolve_root(Some(tmp.path())).expect("explicit root should resolve");
        assert_eq!(result, tmp.path());
    }

    #[test]
    fn resolve_root_rejects_explicit_non_repo() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let err = resolve_root(Some(tmp.path())).expect_err("non-repo should be rejected");
        assert!(
            err.to_string().contains("Not a dotfiles repository"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn resolve_root_reads_env_var() {
        // Skip when the ambient environment already pins a root.
        if std::env::var("MICRODOTS_ROOT").is_ok() || std::env::var("DOTFILES_ROOT").is_ok() {
            return;
        }
        let tmp = repo_fixture();
        let _lock = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        unsafe {
            std::env::set_var("MICRODOTS_ROOT", tmp.path());
        }
        let result = resolve_root(None);
        unsafe {
            std::env::remove_var("MICRODOTS_ROOT");
        }
        assert_eq!(result.expect("env root should resolve"), tmp.path());
    }

    #[test]
    fn resolve_root_error_when_nothing_found() {
        if std::env::var("MICRODOTS_ROOT").is_ok() || std::env::var("DOTFILES_ROOT").is_ok() {
            return;
        }
        let tmp = tempfile::tempdir().expect("tempdir");
        let _lock = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let saved_home = std::env::var_os("HOME");
        let saved_dir = std::env::current_dir().ok();
        unsafe {
            std::env::set_var("HOME", tmp.path());
        }
        std::env::set_current_dir(tmp.path()).ok();

        let result = resolve_root(None);

        if let Some(home) = saved_home {
            unsafe {
                std::env::set_var("HOME", home);
            }
        }
        if let Some(dir) = saved_dir {
            std::env::set_current_dir(dir).ok();
        }

        let err = result.expect_err("nothing to find in an empty home");
        assert!(
            err.to_string().contains("No dotfiles repository found"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn config_load_reads_conf_file() {
        if std::env::var("HOME").is_err() {
            return;
        }
        let tmp = repo_fixture();
        std::fs::write(tmp.path().join("dotfiles.conf"), "AUTO_SNAPSHOT=yes\n")
            .expect("write conf");
        let config = Config::load(tmp.path()).expect("load");
        assert!(config.settings.auto_snapshot);
        assert_eq!(config.root, tmp.path());
    }

    #[test]
    fn config_load_without_conf_file() {
        if std::env::var("HOME").is_err() {
            return;
        }
        let tmp = repo_fixture();
        let config = Config::load(tmp.path()).expect("load");
        assert_eq!(config.settings, Settings::default());
    }
}
