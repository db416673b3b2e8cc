//! Topic-based dotfiles engine with a private local overlay.
//!
//! Dotfiles live in topic directories inside a public repository; a second,
//! private tree (the "local layer") holds machine-specific and confidential
//! files and is discovered at runtime by a fixed-precedence search.  Linking
//! runs in two phases, public then local, so the local tree always wins.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: repository root discovery and `dotfiles.conf` parsing
//! - **[`resolve`]**: the local layer precedence search and its cache
//! - **[`topics`]**: topic enumeration and file classification
//! - **[`linker`]**: the symlink engine and infrastructure links
//! - **[`installer`]**: topic `install.sh` orchestration
//! - **[`commands`]**: top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod installer;
pub mod linker;
pub mod logging;
pub mod resolve;
pub mod topics;
