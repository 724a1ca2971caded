//! `dotfiles` binary entry point.
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use dotfiles_cli::cli::{Cli, Command};
use dotfiles_cli::commands;
use dotfiles_cli::error::{DotfilesError, RunnerError, is_interrupted};
use dotfiles_cli::interrupt::Interrupt;
use dotfiles_cli::logging::{self, Logger};

/// Exit status after Ctrl-C.
const EXIT_INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    let args = Cli::parse();
    let name = args.command.name();
    // Completion scripts go to stdout untouched and leave no log file.
    if !matches!(args.command, Command::Completions { .. }) {
        logging::init_subscriber(args.command.verbose(), name);
    }
    let log = Arc::new(Logger::new(name));

    match run(args.command, &log) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_interrupted(&e) => {
            log.warn("interrupted");
            ExitCode::from(EXIT_INTERRUPTED)
        }
        Err(e) => {
            if matches!(
                e.downcast_ref::<DotfilesError>(),
                Some(DotfilesError::UserAborted)
            ) {
                log.error("aborted");
            } else {
                log.error(&format!("{e:#}"));
                if let Some(stderr) = e
                    .downcast_ref::<RunnerError>()
                    .and_then(RunnerError::stderr)
                    .filter(|s| !s.is_empty())
                {
                    log.error(stderr);
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, log: &Arc<Logger>) -> Result<()> {
    match command {
        Command::Install(opts) => commands::install::run(opts, log, &Interrupt::install()?),
        Command::Sync(opts) => commands::sync::run(opts, log, &Interrupt::install()?),
        Command::Uninstall(opts) => {
            commands::uninstall::run(opts, log, &Interrupt::install()?)
        }
        Command::Status => commands::status::run(log),
        Command::Completions { shell } => {
            commands::completions::run(shell);
            Ok(())
        }
    }
}
