//! Command-line definitions.
use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Argument surface of the `dots` binary.
#[derive(Parser, Debug)]
#[command(
    name = "dots",
    about = "Topic-based dotfiles engine with a private local overlay",
    version
)]
pub struct Cli {
    /// Selected subcommand.
    #[command(subcommand)]
    pub command: Command,

    /// Log debug-level detail
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Flags every subcommand accepts.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Flags every subcommand accepts.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Show what would change without touching the filesystem
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Override the dotfiles repository root
    #[arg(long, global = true)]
    pub root: Option<std::path::PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the resolved layout, settings, and link health
    Status,
    /// Link every topic's dotfiles into the home directory
    Relink(RelinkOpts),
    /// Recreate the infrastructure links inside the local layer
    RepairInfrastructure,
    /// Run topic install scripts (public first, then local)
    Install,
    /// Generate shell completions
    Completions(CompletionsOpts),
    /// Print the version
    Version,
}

impl Command {
    /// Stable name used for per-command log files.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Relink(_) => "relink",
            Self::RepairInfrastructure => "repair-infrastructure",
            Self::Install => "install",
            Self::Completions(_) => "completions",
            Self::Version => "version",
        }
    }
}

/// Options for the `relink` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RelinkOpts {
    /// Back up conflicting files and link over them
    #[arg(short, long)]
    pub force: bool,

    /// Remove dangling symlinks in the home directory first
    #[arg(long)]
    pub clean: bool,
}

/// Options for the `completions` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CompletionsOpts {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}
