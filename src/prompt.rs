//! Interactive prompts, injectable so tasks stay testable.
use std::io::{ErrorKind, IsTerminal as _};

use anyhow::Result;
use dialoguer::{Confirm, Input};

use crate::error::DotfilesError;

/// Source of interactive answers.
pub trait Prompt: Send + Sync {
    /// Ask for a free-form value. An empty answer is allowed.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read.
    fn input(&self, label: &str) -> Result<String>;

    /// Ask a yes/no question.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read.
    fn confirm(&self, label: &str, default: bool) -> Result<bool>;
}

/// [`Prompt`] backed by `dialoguer`.
///
/// When stdin is not a terminal nothing is asked: `input` answers with an
/// empty string and `confirm` with its default.
#[derive(Debug, Default, Clone, Copy)]
pub struct DialoguerPrompt;

impl DialoguerPrompt {
    fn interactive() -> bool {
        std::io::stdin().is_terminal()
    }
}

impl Prompt for DialoguerPrompt {
    fn input(&self, label: &str) -> Result<String> {
        if !Self::interactive() {
            return Ok(String::new());
        }
        let value: String = Input::new()
            .with_prompt(label)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| read_error(e, label))?;
        Ok(value.trim().to_string())
    }

    fn confirm(&self, label: &str, default: bool) -> Result<bool> {
        if !Self::interactive() {
            return Ok(default);
        }
        Confirm::new()
            .with_prompt(label)
            .default(default)
            .interact()
            .map_err(|e| read_error(e, "confirmation"))
    }
}

/// Convert a terminal read failure.
///
/// The terminal is in raw mode while a prompt is open, so Ctrl-C arrives as
/// an `Interrupted` read error instead of a signal.
fn read_error(err: dialoguer::Error, what: &str) -> anyhow::Error {
    match err {
        dialoguer::Error::IO(e) if e.kind() == ErrorKind::Interrupted => {
            DotfilesError::Interrupted.into()
        }
        other => anyhow::Error::new(other).context(format!("Failed to read {what}")),
    }
}
