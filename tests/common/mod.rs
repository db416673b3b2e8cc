// Shared helpers for integration tests.
//
// Builds a complete dotfiles layout (public repository, optional local
// tree, home directory) inside one temporary directory so each test can
// run the engine against an isolated real filesystem.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::fs;
use std::os::unix::fs as unix_fs;
use std::path::{Path, PathBuf};

use microdots_cli::logging::Logger;

/// An isolated dotfiles layout backed by a [`tempfile::TempDir`].
///
/// The directory and everything in it are deleted on drop.
pub struct TestLayout {
    tmp: tempfile::TempDir,
}

impl TestLayout {
    /// Create a public repository with its infrastructure directories and
    /// an empty home directory.  The local tree is not created; tests that
    /// need one call [`init_local`](Self::init_local).
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let layout = Self { tmp };
        for dir in ["core/functions", "core/templates", "bin", "docs"] {
            fs::create_dir_all(layout.public().join(dir)).expect("create infrastructure dir");
        }
        fs::write(layout.public().join("MICRODOTS.md"), "# microdots\n")
            .expect("write repository doc");
        fs::create_dir_all(layout.home()).expect("create home");
        layout
    }

    /// Path of the public repository root.
    pub fn public(&self) -> PathBuf {
        self.tmp.path().join("dotfiles")
    }

    /// Path of the local tree.
    pub fn local(&self) -> PathBuf {
        self.tmp.path().join("dotlocal")
    }

    /// Path of the home directory.
    pub fn home(&self) -> PathBuf {
        self.tmp.path().join("home")
    }

    /// Create the local tree and point the repository marker symlink at it.
    pub fn init_local(&self) {
        fs::create_dir_all(self.local()).expect("create local tree");
        unix_fs::symlink(self.local(), self.public().join(".dotlocal"))
            .expect("create repository marker");
    }

    /// Write `content` to `<tree>/<topic>/<name>`, creating the topic
    /// directory as needed.  Returns the written path.
    pub fn topic_file(&self, tree: &Path, topic: &str, name: &str, content: &str) -> PathBuf {
        let dir = tree.join(topic);
        fs::create_dir_all(&dir).expect("create topic dir");
        let path = dir.join(name);
        fs::write(&path, content).expect("write topic file");
        path
    }

}

/// A logger that records task entries; without a tracing subscriber
/// installed its display output goes nowhere, which is what tests want.
pub fn test_logger() -> Logger {
    Logger::new("test")
}

/// Read a symlink's target, with a useful message when the entry is not one.
pub fn link_target(path: &Path) -> PathBuf {
    fs::read_link(path)
        .unwrap_or_else(|e| panic!("{} should be a symlink: {e}", path.display()))
}

/// Names of the entries in a directory, sorted.
pub fn dir_entries(path: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(path)
        .expect("read dir")
        .filter_map(|entry| entry.ok()?.file_name().into_string().ok())
        .collect();
    names.sort();
    names
}
