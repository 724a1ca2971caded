//! Domain-specific error types for the dotfiles engine.
//!
//! The runner returns typed [`RunnerError`]s; task and command code works in
//! [`anyhow::Result`] and the typed errors travel through `?` unchanged, so
//! `main` can recover them with `downcast_ref` and pick an exit code.
//!
//! # Error hierarchy
//!
//! ```text
//! RunnerError               - external process boundary
//! ├── CommandFailed         - non-zero exit where success was required
//! ├── EscalationFailed      - `sudo -v` (or equivalent) was rejected
//! ├── Spawn                 - program could not be started
//! ├── EmptyCommand          - empty argv
//! └── Interrupted           - Ctrl-C arrived while a child was running
//! DotfilesError             - orchestration outcomes
//! ├── UserAborted
//! ├── Interrupted
//! └── Config(ConfigError)
//! ```

use thiserror::Error;

/// Errors raised by the command runner.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The process exited non-zero and the caller required success.
    #[error("command failed: {} (exit {exit_code})", .argv.join(" "))]
    CommandFailed {
        /// Full argument vector, including any escalation prefix.
        argv: Vec<String>,
        /// Exit code reported by the process.
        exit_code: i32,
        /// Captured standard error; empty when output was not captured.
        stderr: String,
    },

    /// Privilege escalation could not be validated.
    #[error("privilege escalation failed (exit {exit_code})")]
    EscalationFailed {
        /// Exit code of the validation command.
        exit_code: i32,
        /// Captured standard error of the validation command.
        stderr: String,
    },

    /// The program could not be started at all.
    #[error("failed to execute '{program}': {source}")]
    Spawn {
        /// Program name (first argv token).
        program: String,
        /// Underlying I/O error from the spawn attempt.
        source: std::io::Error,
    },

    /// An empty argument vector was passed to the runner.
    #[error("refusing to execute an empty command")]
    EmptyCommand,

    /// The user interrupted the run while a command was executing.
    #[error("interrupted")]
    Interrupted,
}

impl RunnerError {
    /// Exit code carried by the error, if any.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { exit_code, .. } | Self::EscalationFailed { exit_code, .. } => {
                Some(*exit_code)
            }
            Self::Spawn { .. } | Self::EmptyCommand | Self::Interrupted => None,
        }
    }

    /// Captured standard error carried by the error, if any.
    #[must_use]
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { stderr, .. } | Self::EscalationFailed { stderr, .. } => {
                Some(stderr)
            }
            Self::Spawn { .. } | Self::EmptyCommand | Self::Interrupted => None,
        }
    }
}

/// Errors that end a command outside the runner.
#[derive(Error, Debug)]
pub enum DotfilesError {
    /// The user declined a confirmation prompt.
    #[error("aborted by user")]
    UserAborted,

    /// The user interrupted the run between tasks.
    #[error("interrupted")]
    Interrupted,

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that arise while building the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Neither `DOTFILES_HOME` nor `HOME` is set.
    #[error("cannot determine home directory: set HOME or DOTFILES_HOME")]
    NoHome,

    /// The config file exists but could not be read.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for the expected schema.
    #[error("Invalid config file {path}: {message}")]
    Parse {
        /// Path to the offending file.
        path: String,
        /// Parser message.
        message: String,
    },
}

/// Whether an error chain represents a user interruption.
#[must_use]
pub fn is_interrupted(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<RunnerError>(),
        Some(RunnerError::Interrupted)
    ) || matches!(
        err.downcast_ref::<DotfilesError>(),
        Some(DotfilesError::Interrupted)
    )
}
