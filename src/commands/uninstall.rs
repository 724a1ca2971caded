//! Uninstall command implementation.
use std::sync::Arc;

use anyhow::Result;

use crate::cli::UninstallOpts;
use crate::error::DotfilesError;
use crate::exec::ExecutionMode;
use crate::interrupt::Interrupt;
use crate::logging::Logger;
use crate::prompt::{DialoguerPrompt, Prompt};
use crate::tasks;

/// Question asked before anything is removed.
pub const CONFIRM_LABEL: &str = "Are you sure you want to uninstall?";

/// Ask for confirmation unless `--force` was given.
///
/// # Errors
///
/// Returns [`DotfilesError::UserAborted`] when the user declines.
pub fn confirm(opts: UninstallOpts, prompt: &dyn Prompt) -> Result<()> {
    if opts.force || prompt.confirm(CONFIRM_LABEL, false)? {
        Ok(())
    } else {
        Err(DotfilesError::UserAborted.into())
    }
}

/// Run the uninstall command.
///
/// # Errors
///
/// Returns an error if the user declines, configuration loading fails, or a
/// task fails fatally.
pub fn run(opts: UninstallOpts, log: &Arc<Logger>, interrupt: &Interrupt) -> Result<()> {
    let prompt: Arc<dyn Prompt> = Arc::new(DialoguerPrompt);
    confirm(opts, prompt.as_ref())?;

    let mode = ExecutionMode {
        dry_run: opts.dry_run,
        verbose: false,
    };
    let ctx = super::build_context(mode, log, interrupt, prompt)?;
    super::run_phases(&tasks::uninstall_phases(opts.remove_tools), &ctx, log)?;
    log.success("uninstall complete");
    Ok(())
}
