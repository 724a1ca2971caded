//! Command-line interface definition.
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "dotfiles",
    about = "Set up a development machine: packages, tools, and dotfile symlinks",
    version = crate::VERSION
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Full installation of packages, tools, and configurations
    Install(PipelineOpts),
    /// Pull the dotfiles and re-apply configurations
    Sync(PipelineOpts),
    /// Remove symlinks and optionally installed tools
    Uninstall(UninstallOpts),
    /// Show installation status of all components
    Status,
    /// Print a shell completion script to stdout
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

impl Command {
    /// Name used for the log file of this invocation.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Install(_) => "install",
            Self::Sync(_) => "sync",
            Self::Uninstall(_) => "uninstall",
            Self::Status => "status",
            Self::Completions { .. } => "completions",
        }
    }

    /// Whether `--verbose` was requested.
    #[must_use]
    pub const fn verbose(&self) -> bool {
        match self {
            Self::Install(opts) | Self::Sync(opts) => opts.verbose,
            _ => false,
        }
    }
}

/// Options for `install` and `sync`.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct PipelineOpts {
    /// Show what would be done without making changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print every command before it runs
    #[arg(short, long)]
    pub verbose: bool,
}

/// Options for `uninstall`.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct UninstallOpts {
    /// Also remove installed tools (Oh My Zsh, proto, TPM)
    #[arg(long)]
    pub remove_tools: bool,

    /// Show what would be done without making changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_install_dry_run_short() {
        let cli = Cli::parse_from(["dotfiles", "install", "-n", "-v"]);
        assert!(matches!(
            cli.command,
            Command::Install(PipelineOpts {
                dry_run: true,
                verbose: true
            })
        ));
    }

    #[test]
    fn parse_sync_long_flags() {
        let cli = Cli::parse_from(["dotfiles", "sync", "--dry-run", "--verbose"]);
        assert_eq!(cli.command.name(), "sync");
        assert!(cli.command.verbose());
    }

    #[test]
    fn parse_uninstall_flags() {
        let cli = Cli::parse_from(["dotfiles", "uninstall", "--remove-tools", "-n", "-f"]);
        assert!(matches!(
            cli.command,
            Command::Uninstall(UninstallOpts {
                remove_tools: true,
                dry_run: true,
                force: true
            })
        ));
    }

    #[test]
    fn uninstall_defaults() {
        let cli = Cli::parse_from(["dotfiles", "uninstall"]);
        assert!(matches!(
            cli.command,
            Command::Uninstall(UninstallOpts {
                remove_tools: false,
                dry_run: false,
                force: false
            })
        ));
        assert!(!cli.command.verbose());
    }

    #[test]
    fn parse_status() {
        let cli = Cli::parse_from(["dotfiles", "status"]);
        assert!(matches!(cli.command, Command::Status));
    }

    #[test]
    fn parse_completions() {
        let cli = Cli::parse_from(["dotfiles", "completions", "zsh"]);
        assert!(matches!(
            cli.command,
            Command::Completions { shell: Shell::Zsh }
        ));
    }

    #[test]
    fn status_rejects_dry_run() {
        assert!(Cli::try_parse_from(["dotfiles", "status", "--dry-run"]).is_err());
    }

    #[test]
    fn subcommand_required() {
        assert!(Cli::try_parse_from(["dotfiles"]).is_err());
    }

    #[test]
    fn version_flag() {
        let err = Cli::try_parse_from(["dotfiles", "-V"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
        assert_eq!(err.to_string().trim(), format!("dotfiles {}", crate::VERSION));
    }
}
