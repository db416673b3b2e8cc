//! Command: print version information.
use std::io::Write as _;

use anyhow::Result;

/// Print the version to stdout.
///
/// `MICRODOTS_VERSION` is injected by release builds; local builds fall
/// back to the cargo package version.
///
/// # Errors
///
/// Returns an error if stdout cannot be written to.
pub fn run() -> Result<()> {
    let version = option_env!("MICRODOTS_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    writeln!(std::io::stdout(), "dots {version}")?;
    Ok(())
}
