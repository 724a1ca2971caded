//! Directory layout, stow packages, and local script links.
use std::path::Path;

use anyhow::{Context as _, Result};

use super::{Context, Task, TaskResult};
use crate::exec::ExecOpts;

/// Stow packages under `config/`, deployed in this order.
pub const STOW_PACKAGES: &[&str] = &["zsh", "tmux", "nvim"];

/// Scripts linked into `~/.local/bin`, by file name under `scripts/`.
pub const LOCAL_SCRIPTS: &[&str] = &["update-setup"];

/// Create `~/projects` and `~/.local/bin`.
#[derive(Debug)]
pub struct SetupDirectories;

impl Task for SetupDirectories {
    fn name(&self) -> &'static str {
        "Set up directories"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let dirs = [ctx.home().join("projects"), ctx.paths().local_bin.clone()];
        let mut created = 0usize;
        for dir in &dirs {
            if dir.exists() {
                ctx.log.skip(&format!("{} already exists", dir.display()));
                continue;
            }
            if ctx.dry_run() {
                ctx.log.dry_run(&format!("create {}", dir.display()));
            } else {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
                ctx.log.success(&format!("{} created", dir.display()));
            }
            created += 1;
        }
        if created == 0 {
            Ok(TaskResult::Skipped("directories already exist".to_string()))
        } else {
            Ok(ctx.applied())
        }
    }
}

/// Symlink configuration packages into the home directory with GNU Stow.
#[derive(Debug)]
pub struct DeployConfigs;

impl Task for DeployConfigs {
    fn name(&self) -> &'static str {
        "Deploy configurations"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let home = ctx.home().to_string_lossy().into_owned();
        let config_dir = &ctx.paths().config_dir;
        let config_dir_str = config_dir.to_string_lossy();

        let mut deployed = 0usize;
        for &package in STOW_PACKAGES {
            let package_dir = config_dir.join(package);
            if !package_dir.exists() {
                ctx.log.skip(&format!("stow package '{package}' not found"));
                continue;
            }
            if is_deployed(&package_dir, ctx.home()) {
                ctx.log.skip(&format!("{package} configuration already deployed"));
                continue;
            }

            // Oh My Zsh writes a regular .zshrc that would block the link.
            if package == "zsh" {
                let zshrc = ctx.home().join(".zshrc");
                if zshrc.exists() && !zshrc.is_symlink() {
                    ctx.log.info("removing existing non-symlink .zshrc");
                    if !ctx.dry_run() {
                        std::fs::remove_file(&zshrc)
                            .with_context(|| format!("removing {}", zshrc.display()))?;
                    }
                }
            }

            ctx.log.info(&format!("stowing {package}"));
            ctx.runner.execute(
                &["stow", "-t", &home, "-d", &config_dir_str, "--restow", package],
                ExecOpts::checked(),
            )?;
            ctx.log.success(&format!("{package} configuration deployed"));
            deployed += 1;
        }

        if deployed == 0 {
            Ok(TaskResult::Skipped("nothing to deploy".to_string()))
        } else {
            Ok(ctx.applied())
        }
    }
}

/// Whether every entry of a stow package is already linked under `target`.
///
/// Follows stow's tree folding: an entry is deployed when its target is a
/// symlink resolving to it, or when both are directories whose own entries
/// are all deployed.
fn is_deployed(package_dir: &Path, target: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(package_dir) else {
        return false;
    };
    entries.filter_map(Result::ok).all(|entry| {
        let source = entry.path();
        let dest = target.join(entry.file_name());
        if dest.is_symlink() {
            return links_to(&dest, &source);
        }
        source.is_dir() && dest.is_dir() && is_deployed(&source, &dest)
    })
}

fn links_to(link: &Path, source: &Path) -> bool {
    match (link.canonicalize(), source.canonicalize()) {
        (Ok(resolved), Ok(expected)) => resolved == expected,
        _ => false,
    }
}

/// Remove the symlinks created by [`DeployConfigs`].
#[derive(Debug)]
pub struct RemoveConfigs;

impl Task for RemoveConfigs {
    fn name(&self) -> &'static str {
        "Remove configurations"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let home = ctx.home().to_string_lossy().into_owned();
        let config_dir = &ctx.paths().config_dir;
        let config_dir_str = config_dir.to_string_lossy();

        let mut removed = 0usize;
        for &package in STOW_PACKAGES {
            if !config_dir.join(package).exists() {
                continue;
            }
            ctx.log.info(&format!("unstowing {package}"));
            let result = ctx.runner.execute(
                &["stow", "-D", "-t", &home, "-d", &config_dir_str, package],
                ExecOpts::unchecked(),
            )?;
            if result.success() {
                ctx.log.success(&format!("{package} unstowed"));
            } else {
                ctx.log.warn(&format!("could not unstow {package}"));
            }
            removed += 1;
        }

        if removed == 0 {
            Ok(TaskResult::Skipped("no stow packages found".to_string()))
        } else {
            Ok(ctx.applied())
        }
    }
}

/// Symlink helper scripts into `~/.local/bin`.
#[derive(Debug)]
pub struct LinkLocalScripts;

impl Task for LinkLocalScripts {
    fn name(&self) -> &'static str {
        "Link local scripts"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let mut linked = 0usize;
        for &script in LOCAL_SCRIPTS {
            let source = ctx.paths().scripts_dir.join(script);
            let dest = ctx.paths().local_bin.join(script);

            if dest.exists() || dest.is_symlink() {
                ctx.log.skip(&format!("{script} symlink already exists"));
                continue;
            }
            if !source.exists() {
                ctx.log
                    .error(&format!("source script {} not found", source.display()));
                continue;
            }

            if ctx.dry_run() {
                ctx.log.dry_run(&format!(
                    "link {} -> {}",
                    dest.display(),
                    source.display()
                ));
            } else {
                std::os::unix::fs::symlink(&source, &dest).with_context(|| {
                    format!("linking {} -> {}", dest.display(), source.display())
                })?;
                ctx.log
                    .success(&format!("{script} symlinked to {}", source.display()));
            }
            linked += 1;
        }

        if linked == 0 {
            Ok(TaskResult::Skipped("no scripts to link".to_string()))
        } else {
            Ok(ctx.applied())
        }
    }
}

/// Remove the script symlinks created by [`LinkLocalScripts`].
#[derive(Debug)]
pub struct UnlinkLocalScripts;

impl Task for UnlinkLocalScripts {
    fn name(&self) -> &'static str {
        "Remove local scripts"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let mut removed = 0usize;
        for &script in LOCAL_SCRIPTS {
            let dest = ctx.paths().local_bin.join(script);
            if !dest.is_symlink() {
                continue;
            }
            if ctx.dry_run() {
                ctx.log.dry_run(&format!("remove {}", dest.display()));
            } else {
                std::fs::remove_file(&dest)
                    .with_context(|| format!("removing {}", dest.display()))?;
                ctx.log.success(&format!("{script} symlink removed"));
            }
            removed += 1;
        }

        if removed == 0 {
            Ok(TaskResult::Skipped("no script symlinks found".to_string()))
        } else {
            Ok(ctx.applied())
        }
    }
}
