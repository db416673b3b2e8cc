//! Discovery of the private "local layer" root.
//!
//! The local layer is a second dotfiles tree, outside the public
//! repository, holding machine-private configuration.  Its root is found
//! by a fixed five-level precedence search:
//!
//! 1. `DOTLOCAL` / `LOCAL_PATH` in `dotfiles.conf`
//! 2. `<root>/.dotlocal` as a symlink, followed exactly one hop
//! 3. `<root>/.dotlocal` as a plain directory
//! 4. `~/.dotlocal`
//! 5. cloud provider directories and mounted volumes (see [`cloud`])
//!
//! The search stops at the first level whose candidate is an existing
//! directory.  Resolution is a read-only probe: a candidate that cannot
//! be examined (missing, permission denied, looping symlink) simply does
//! not match, and the search moves on.  The answer is memoized in a
//! [`PathCache`] until explicitly invalidated.

mod cache;
pub mod cloud;

pub use cache::PathCache;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::ResolveError;

/// Basename of the discovery marker, probed at the repository root
/// (levels 2 and 3) and under home (level 4).
pub const DOTLOCAL_DIR_NAME: &str = ".dotlocal";

/// Default mount point scanned for `<volume>/Dotlocal` candidates.
const VOLUMES_ROOT: &str = "/Volumes";

/// Which precedence level produced a resolution.
///
/// Variant order mirrors search order.  Commands report the method
/// verbatim so the user can see why a particular path won.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryMethod {
    /// `DOTLOCAL` or `LOCAL_PATH` in `dotfiles.conf`.
    ExplicitConfig,
    /// `<root>/.dotlocal` symlink, followed one hop.
    Symlink,
    /// `<root>/.dotlocal` plain directory.
    Directory,
    /// `~/.dotlocal`.
    StandardDefault,
    /// A cloud provider directory or mounted volume.
    Cloud,
    /// No level matched.
    NotFound,
}

impl fmt::Display for DiscoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ExplicitConfig => "dotfiles.conf",
            Self::Symlink => "repository symlink",
            Self::Directory => "repository directory",
            Self::StandardDefault => "home default",
            Self::Cloud => "cloud discovery",
            Self::NotFound => "not found",
        };
        f.write_str(label)
    }
}

/// Outcome of one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The discovered local root, absent when nothing matched.
    pub path: Option<PathBuf>,
    /// The level that produced it.
    pub method: DiscoveryMethod,
}

impl Resolution {
    /// A successful resolution at the given level.
    #[must_use]
    pub const fn found(path: PathBuf, method: DiscoveryMethod) -> Self {
        Self {
            path: Some(path),
            method,
        }
    }

    /// The not-found sentinel.
    #[must_use]
    pub const fn not_found() -> Self {
        Self {
            path: None,
            method: DiscoveryMethod::NotFound,
        }
    }

    /// Whether a local root was discovered.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        self.path.is_some()
    }
}

/// Runs the precedence search and owns its cache.
#[derive(Debug)]
pub struct LocalResolver {
    public_root: PathBuf,
    home: PathBuf,
    volumes_root: PathBuf,
    cache: PathCache,
}

impl LocalResolver {
    /// Resolver for the given repository and home directory.
    #[must_use]
    pub fn new(public_root: &Path, home: &Path) -> Self {
        Self {
            public_root: public_root.to_path_buf(),
            home: home.to_path_buf(),
            volumes_root: PathBuf::from(VOLUMES_ROOT),
            cache: PathCache::new(),
        }
    }

    /// Override the volume mount point scanned at level 5.
    #[must_use]
    pub fn with_volumes_root(mut self, volumes_root: &Path) -> Self {
        self.volumes_root = volumes_root.to_path_buf();
        self
    }

    /// Resolve the local root, memoizing the answer.
    ///
    /// Repeated calls return the cached resolution even if the
    /// filesystem changed in between; call [`invalidate`](Self::invalidate)
    /// after mutating anything the search examines.
    pub fn resolve(&mut self) -> Resolution {
        if let Some(hit) = self.cache.get() {
            return hit.clone();
        }
        let resolution = self.search();
        self.cache.set(resolution.clone());
        resolution
    }

    /// Drop the memoized resolution so the next call re-probes.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    /// Where [`ensure_default_local`](Self::ensure_default_local) would
    /// create the local layer, whether or not it exists yet.
    #[must_use]
    pub fn default_local_path(&self) -> PathBuf {
        self.home.join(DOTLOCAL_DIR_NAME)
    }

    /// Create `~/.dotlocal` if no directory exists there yet.
    ///
    /// The explicit counterpart to the read-only search: resolution never
    /// mutates the filesystem, so bootstrapping the default location is a
    /// separate call.  Invalidates the cache so the next resolution sees
    /// the new directory.
    pub fn ensure_default_local(&mut self) -> Result<PathBuf, ResolveError> {
        let default = self.default_local_path();
        if !default.is_dir() {
            fs::create_dir_all(&default).map_err(|source| ResolveError::Create {
                path: default.display().to_string(),
                source,
            })?;
            self.cache.clear();
        }
        Ok(default)
    }

    fn search(&self) -> Resolution {
        // Level 1: explicit override from dotfiles.conf.
        let settings = Settings::load(&self.public_root.join("dotfiles.conf"), &self.home);
        if let Some(path) = settings.dotlocal
            && path.is_dir()
        {
            return Resolution::found(path, DiscoveryMethod::ExplicitConfig);
        }

        // Levels 2 and 3: the repository marker, classified without
        // following links so a symlink is never mistaken for a directory.
        let marker = self.public_root.join(DOTLOCAL_DIR_NAME);
        match fs::symlink_metadata(&marker) {
            Ok(meta) if meta.is_symlink() => {
                if let Some(target) = follow_one_hop(&marker, &self.public_root) {
                    return Resolution::found(target, DiscoveryMethod::Symlink);
                }
            }
            Ok(meta) if meta.is_dir() => {
                return Resolution::found(marker, DiscoveryMethod::Directory);
            }
            _ => {}
        }

        // Level 4: the home default.
        let default = self.home.join(DOTLOCAL_DIR_NAME);
        if default.is_dir() {
            return Resolution::found(default, DiscoveryMethod::StandardDefault);
        }

        // Level 5: cloud providers, then mounted volumes.
        cloud::provider_candidates(&self.home)
            .into_iter()
            .chain(cloud::volume_candidates(&self.volumes_root))
            .find(|candidate| candidate.is_dir())
            .map_or_else(Resolution::not_found, |candidate| {
                Resolution::found(candidate, DiscoveryMethod::Cloud)
            })
    }
}

/// Follow a discovery symlink exactly one hop.
///
/// Relative targets resolve against the repository root.  A link that
/// points at itself, at a missing path, or at anything other than a
/// directory yields `None` and the search continues at the next level.
/// A longer cycle also lands here: probing the first hop runs into the
/// kernel's link limit and reads as nonexistent.
fn follow_one_hop(link: &Path, base: &Path) -> Option<PathBuf> {
    let target = fs::read_link(link).ok()?;
    let resolved = if target.is_absolute() {
        target
    } else {
        base.join(target)
    };
    if resolved == link {
        return None;
    }
    resolved.is_dir().then_some(resolved)
}
