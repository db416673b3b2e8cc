//! Command: generate shell completion scripts.
use anyhow::Result;
use clap::CommandFactory as _;

use crate::cli::{Cli, CompletionsOpts};

/// Write a completion script for the requested shell to stdout.
///
/// # Errors
///
/// Currently infallible; the `Result` keeps the signature uniform with the
/// other commands.
pub fn run(opts: &CompletionsOpts) -> Result<()> {
    let mut command = Cli::command();
    clap_complete::generate(opts.shell, &mut command, "dots", &mut std::io::stdout());
    Ok(())
}
