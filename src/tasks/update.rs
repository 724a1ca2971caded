//! Updating the dotfiles checkout.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::exec::ExecOpts;

/// Pull the latest commits into the dotfiles checkout.
#[derive(Debug)]
pub struct PullDotfiles;

impl Task for PullDotfiles {
    fn name(&self) -> &'static str {
        "Pull dotfiles"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let dir = &ctx.config.dotfiles_dir;
        if !dir.join(".git").exists() {
            return Ok(TaskResult::Skipped(format!(
                "{} is not a git checkout",
                dir.display()
            )));
        }

        ctx.log.info("pulling latest changes");
        let dir_str = dir.to_string_lossy();
        let result = ctx.runner.execute(
            &["git", "-C", &dir_str, "pull", "--rebase"],
            ExecOpts::unchecked(),
        )?;
        if result.success() {
            ctx.log.success("dotfiles up to date");
        } else {
            ctx.log
                .warn(&format!("git pull failed (exit {})", result.code));
        }
        Ok(ctx.applied())
    }
}
