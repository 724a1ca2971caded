//! Personal machine bootstrap.
//!
//! Installs system packages and developer tools, deploys dotfiles with GNU
//! Stow, and keeps everything current. Every step is an idempotent task that
//! checks whether its work is already done before acting.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]**: layered configuration from defaults, TOML, and `DOTFILES_*`
//! - **[`exec`]**: the command runner with dry-run and privilege escalation
//! - **[`tasks`]**: named, idempotent units of work grouped into phases
//! - **[`commands`]**: top-level subcommand orchestration (`install`, `sync`, …)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod interrupt;
pub mod logging;
pub mod platform;
pub mod prompt;
pub mod tasks;

/// Version reported by `--version` and the log file header.
pub const VERSION: &str = match option_env!("DOTFILES_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};
