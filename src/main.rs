//! `dots` binary entry point: parses the CLI and dispatches subcommands.

use std::process::ExitCode;

use clap::Parser;

use microdots_cli::cli::{Cli, Command};
use microdots_cli::commands;
use microdots_cli::error::TasksFailed;
use microdots_cli::logging::{self, Log, Logger};

fn main() -> ExitCode {
    let args = Cli::parse();
    logging::init_subscriber(args.verbose, args.command.name());
    let log = Logger::new(args.command.name());

    match run(&args, &log) {
        Ok(()) => ExitCode::SUCCESS,
        // The summary already itemized what failed; the exit code is the
        // machine-readable part.
        Err(e) if e.downcast_ref::<TasksFailed>().is_some() => ExitCode::from(1),
        Err(e) => {
            log.error(&format!("{e:#}"));
            ExitCode::from(2)
        }
    }
}

fn run(args: &Cli, log: &Logger) -> anyhow::Result<()> {
    match &args.command {
        Command::Status => commands::status::run(&args.global, log),
        Command::Relink(opts) => commands::relink::run(&args.global, opts, log),
        Command::RepairInfrastructure => commands::repair::run(&args.global, log),
        Command::Install => commands::install::run(&args.global, log),
        Command::Completions(opts) => commands::completions::run(opts),
        Command::Version => commands::version::run(),
    }
}
