//! Install command implementation.
use std::sync::Arc;

use anyhow::Result;

use crate::cli::PipelineOpts;
use crate::exec::ExecutionMode;
use crate::interrupt::Interrupt;
use crate::logging::Logger;
use crate::prompt::DialoguerPrompt;
use crate::tasks;

/// Run the install command.
///
/// # Errors
///
/// Returns an error if configuration loading fails or a task fails fatally.
pub fn run(opts: PipelineOpts, log: &Arc<Logger>, interrupt: &Interrupt) -> Result<()> {
    log.info(&format!("dotfiles {}", crate::VERSION));
    let mode = ExecutionMode {
        dry_run: opts.dry_run,
        verbose: opts.verbose,
    };
    let ctx = super::build_context(mode, log, interrupt, Arc::new(DialoguerPrompt))?;
    super::run_phases(&tasks::install_phases(), &ctx, log)?;

    log.success("installation complete");
    log.info("restart your shell or run: source ~/.zshrc");
    Ok(())
}
