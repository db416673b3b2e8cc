//! Cloud-synced and mounted-volume candidates for the local layer.
//!
//! Lowest-priority discovery level: a fixed table of well-known
//! provider sync directories, then a scan of mounted volumes.  Order is
//! part of the contract; iCloud Drive wins over Dropbox and so on.

use std::fs;
use std::path::{Path, PathBuf};

/// Directory name probed inside each provider root and mounted volume.
pub const CLOUD_DIR_NAME: &str = "Dotlocal";

/// Well-known provider sync directories, relative to the home directory,
/// in precedence order.
const PROVIDER_SUBDIRS: [&str; 4] = [
    "Library/Mobile Documents/com~apple~CloudDocs/Dotlocal",
    "Dropbox/Dotlocal",
    "Google Drive/Dotlocal",
    "OneDrive/Dotlocal",
];

/// Provider candidates under `home`, in precedence order.
///
/// Pure path construction; existence is probed by the caller.
pub fn provider_candidates(home: &Path) -> Vec<PathBuf> {
    PROVIDER_SUBDIRS.iter().map(|sub| home.join(sub)).collect()
}

/// `<volume>/Dotlocal` for every entry under `volumes_root`, sorted by
/// volume name so the scan order is deterministic.
///
/// An unreadable or missing volumes root yields an empty list; external
/// volumes are optional.
pub fn volume_candidates(volumes_root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(volumes_root) else {
        return Vec::new();
    };
    let mut candidates: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path().join(CLOUD_DIR_NAME))
        .collect();
    candidates.sort();
    candidates
}
