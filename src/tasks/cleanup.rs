//! Tool directory removal for `uninstall --remove-tools`.
use std::path::Path;

use anyhow::{Context as _, Result};

use super::{Context, Task, TaskResult};

/// Recursively delete `dir` unless it is absent or this is a dry run.
fn remove_tree(ctx: &Context, label: &str, dir: &Path) -> Result<TaskResult> {
    if !dir.exists() {
        return Ok(TaskResult::Skipped(format!("{label} not installed")));
    }
    if ctx.dry_run() {
        ctx.log.dry_run(&format!("remove {}", dir.display()));
        return Ok(TaskResult::DryRun);
    }
    ctx.log.info(&format!("removing {label}"));
    std::fs::remove_dir_all(dir).with_context(|| format!("removing {}", dir.display()))?;
    ctx.log.success(&format!("{label} removed"));
    Ok(TaskResult::Ok)
}

/// Delete `~/.oh-my-zsh`.
#[derive(Debug)]
pub struct RemoveOhMyZsh;

impl Task for RemoveOhMyZsh {
    fn name(&self) -> &'static str {
        "Remove Oh My Zsh"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        remove_tree(ctx, "Oh My Zsh", &ctx.paths().oh_my_zsh_dir)
    }
}

/// Delete `~/.proto` with every tool it manages.
#[derive(Debug)]
pub struct RemoveProto;

impl Task for RemoveProto {
    fn name(&self) -> &'static str {
        "Remove proto"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        remove_tree(ctx, "proto", &ctx.paths().proto_home)
    }
}

/// Delete the Tmux Plugin Manager checkout.
#[derive(Debug)]
pub struct RemoveTpm;

impl Task for RemoveTpm {
    fn name(&self) -> &'static str {
        "Remove TPM"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        remove_tree(ctx, "TPM", &ctx.paths().tpm_dir)
    }
}
