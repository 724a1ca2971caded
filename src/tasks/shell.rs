//! Oh My Zsh, zsh plugins, and the default login shell.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};

use super::{Context, Task, TaskResult};
use crate::exec::ExecOpts;

/// Oh My Zsh unattended installer.
const OH_MY_ZSH_INSTALL: &str = "curl -fsSL https://raw.githubusercontent.com/ohmyzsh/ohmyzsh/master/tools/install.sh | sh -s -- --unattended";

/// Theme and plugins cloned into `~/.oh-my-zsh/custom`: name, repository,
/// path relative to the custom directory.
pub const ZSH_PLUGINS: &[(&str, &str, &str)] = &[
    (
        "powerlevel10k",
        "https://github.com/romkatv/powerlevel10k.git",
        "themes/powerlevel10k",
    ),
    (
        "zsh-completions",
        "https://github.com/zsh-users/zsh-completions.git",
        "plugins/zsh-completions",
    ),
    (
        "zsh-autosuggestions",
        "https://github.com/zsh-users/zsh-autosuggestions.git",
        "plugins/zsh-autosuggestions",
    ),
    (
        "zsh-syntax-highlighting",
        "https://github.com/zsh-users/zsh-syntax-highlighting.git",
        "plugins/zsh-syntax-highlighting",
    ),
];

/// Install Oh My Zsh.
#[derive(Debug)]
pub struct InstallOhMyZsh;

impl Task for InstallOhMyZsh {
    fn name(&self) -> &'static str {
        "Install Oh My Zsh"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if ctx.paths().oh_my_zsh_dir.exists() {
            return Ok(TaskResult::Skipped("Oh My Zsh already installed".to_string()));
        }
        ctx.log.info("installing Oh My Zsh");
        ctx.runner
            .execute_shell(OH_MY_ZSH_INSTALL, ExecOpts::checked())?;
        ctx.log.success("Oh My Zsh installed");
        Ok(ctx.applied())
    }
}

/// Clone the Powerlevel10k theme and zsh plugins.
#[derive(Debug)]
pub struct InstallZshPlugins;

impl Task for InstallZshPlugins {
    fn name(&self) -> &'static str {
        "Install zsh plugins"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if !ctx.paths().oh_my_zsh_dir.exists() {
            return Ok(TaskResult::Skipped("Oh My Zsh not installed".to_string()));
        }

        let mut installed = 0usize;
        for &(name, repo, subpath) in ZSH_PLUGINS {
            let dest = ctx.paths().oh_my_zsh_custom.join(subpath);
            if dest.exists() {
                ctx.log.skip(&format!("{name} already installed"));
                continue;
            }
            ctx.log.info(&format!("installing {name}"));
            if !ctx.dry_run()
                && let Some(parent) = dest.parent()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            let dest_str = dest.to_string_lossy();
            ctx.runner.execute(
                &["git", "clone", "--depth=1", repo, &dest_str],
                ExecOpts::checked(),
            )?;
            ctx.log.success(&format!("{name} installed"));
            installed += 1;
        }

        if installed == 0 {
            Ok(TaskResult::Skipped("all plugins already installed".to_string()))
        } else {
            Ok(ctx.applied())
        }
    }
}

/// Pull the latest commits of every cloned theme and plugin.
#[derive(Debug)]
pub struct UpdateZshPlugins;

impl Task for UpdateZshPlugins {
    fn name(&self) -> &'static str {
        "Update zsh plugins"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let custom = &ctx.paths().oh_my_zsh_custom;
        if !custom.exists() {
            return Ok(TaskResult::Skipped("no custom plugins directory".to_string()));
        }

        let checkouts: Vec<PathBuf> = ["plugins", "themes"]
            .iter()
            .flat_map(|sub| git_checkouts(&custom.join(sub)))
            .collect();
        if checkouts.is_empty() {
            return Ok(TaskResult::Skipped("no plugin checkouts found".to_string()));
        }

        for dir in &checkouts {
            let name = dir
                .file_name()
                .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
            ctx.log.info(&format!("updating {name}"));
            let dir_str = dir.to_string_lossy();
            let result = ctx.runner.execute(
                &["git", "-C", &dir_str, "pull", "--rebase"],
                ExecOpts::unchecked(),
            )?;
            if !result.success() {
                ctx.log.warn(&format!("could not update {name}"));
            }
        }
        ctx.log.success("zsh plugins updated");
        Ok(ctx.applied())
    }
}

/// Subdirectories of `dir` that contain a `.git` entry, sorted by name.
fn git_checkouts(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir() && p.join(".git").exists())
        .collect();
    dirs.sort();
    dirs
}

/// Login shell field (the seventh) of a `getent passwd` line.
fn passwd_shell(entry: &str) -> Option<&str> {
    entry.lines().next()?.split(':').nth(6).map(str::trim)
}

/// Make zsh the login shell.
///
/// The current login shell is read from the passwd database rather than
/// `$SHELL`, which keeps its old value until the next login.
#[derive(Debug)]
pub struct SetDefaultShell;

impl Task for SetDefaultShell {
    fn name(&self) -> &'static str {
        "Set default shell"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let Some(user) = ctx.config.user.as_deref() else {
            bail!("cannot determine the current user ($USER is not set)");
        };

        let entry = ctx
            .runner
            .execute(&["getent", "passwd", user], ExecOpts::unchecked().captured())?;
        if entry.success() && passwd_shell(&entry.stdout).is_some_and(|s| s.ends_with("zsh")) {
            return Ok(TaskResult::Skipped(
                "zsh is already the default shell".to_string(),
            ));
        }

        ctx.log.info(&format!("setting zsh as default shell for {user}"));
        ctx.runner.execute(
            &["chsh", "-s", "/bin/zsh", user],
            ExecOpts::checked().escalated(),
        )?;
        ctx.log.success("default shell set to zsh");
        Ok(ctx.applied())
    }
}
