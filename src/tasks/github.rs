//! GitHub CLI extensions.
use anyhow::{Result, bail};

use super::{Context, Task, TaskResult};
use crate::exec::ExecOpts;

/// GitHub CLI extensions to install.
pub const GH_EXTENSIONS: &[&str] = &["nektos/gh-act"];

/// Install GitHub CLI extensions.
#[derive(Debug)]
pub struct InstallGhExtensions;

impl Task for InstallGhExtensions {
    fn name(&self) -> &'static str {
        "Install gh extensions"
    }

    fn best_effort(&self) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if !ctx.runner.command_exists("gh") {
            return Ok(TaskResult::Skipped("GitHub CLI not installed".to_string()));
        }

        let listing = ctx.runner.execute(
            &["gh", "extension", "list"],
            ExecOpts::unchecked().captured(),
        )?;

        let missing: Vec<&str> = GH_EXTENSIONS
            .iter()
            .copied()
            .filter(|ext| !listing.stdout.contains(ext))
            .collect();
        if missing.is_empty() {
            return Ok(TaskResult::Skipped("extensions already installed".to_string()));
        }

        for ext in missing {
            ctx.log.info(&format!("installing {ext}"));
            let result = ctx
                .runner
                .execute(&["gh", "extension", "install", ext], ExecOpts::unchecked())?;
            if !result.success() {
                bail!("failed to install {ext} (may need gh auth login first)");
            }
            ctx.log.success(&format!("{ext} installed"));
        }
        Ok(ctx.applied())
    }
}
