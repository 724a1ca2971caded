//! System packages via pacman or apt.
use std::path::Path;

use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::exec::ExecOpts;
use crate::platform::Distro;

/// Packages with the same name on every supported distribution.
pub const COMMON_PACKAGES: &[&str] = &["git", "zsh", "stow", "curl", "neovim"];

/// Extra packages only Arch needs.
const ARCH_EXTRA_PACKAGES: &[&str] = &["base-devel"];

/// PPA providing current Neovim builds on Ubuntu.
const NEOVIM_PPA: &str = "ppa:neovim-ppa/unstable";

/// Directory apt reads extra sources from.
const APT_SOURCES_DIR: &str = "/etc/apt/sources.list.d";

/// Install system packages with the distribution's package manager.
///
/// `pacman --needed` and `apt install` are idempotent, so the install step
/// always runs; the package databases are refreshed first.
#[derive(Debug)]
pub struct InstallPackages;

impl Task for InstallPackages {
    fn name(&self) -> &'static str {
        "Install system packages"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let distro = ctx.config.distro;
        ctx.log.info(&format!("detected distro: {distro}"));
        match distro {
            Distro::Arch => install_pacman(ctx),
            Distro::Ubuntu => install_apt(ctx, Path::new(APT_SOURCES_DIR), true),
            Distro::Debian => install_apt(ctx, Path::new(APT_SOURCES_DIR), false),
            Distro::Unknown => {
                ctx.log.warn(&format!("unsupported distro: {distro}"));
                ctx.log.info(&format!(
                    "please install manually: {}",
                    COMMON_PACKAGES.join(", ")
                ));
                Ok(TaskResult::Skipped("unsupported distribution".to_string()))
            }
        }
    }
}

fn install_pacman(ctx: &Context) -> Result<TaskResult> {
    ctx.log.info("updating pacman database");
    ctx.runner
        .execute(&["pacman", "-Sy"], ExecOpts::unchecked().escalated())?;

    let packages: Vec<&str> = COMMON_PACKAGES
        .iter()
        .chain(ARCH_EXTRA_PACKAGES)
        .copied()
        .collect();
    ctx.log
        .info(&format!("installing packages: {}", packages.join(", ")));
    let mut argv = vec!["pacman", "-S", "--needed", "--noconfirm"];
    argv.extend(&packages);
    ctx.runner.execute(&argv, ExecOpts::checked().escalated())?;

    ctx.log.success("packages installed");
    Ok(ctx.applied())
}

/// Debian sticks to its own `neovim` package; the Neovim PPA is built for
/// Ubuntu releases only, so `use_ppa` is false there.
fn install_apt(ctx: &Context, sources_dir: &Path, use_ppa: bool) -> Result<TaskResult> {
    ctx.log.info("updating apt cache");
    ctx.runner
        .execute(&["apt", "update"], ExecOpts::unchecked().escalated())?;

    if use_ppa {
        if neovim_ppa_present(sources_dir) {
            ctx.log.skip("Neovim PPA already added");
        } else {
            ctx.log.info("adding Neovim unstable PPA");
            ctx.runner.execute(
                &["add-apt-repository", "-y", NEOVIM_PPA],
                ExecOpts::checked().escalated(),
            )?;
            ctx.runner
                .execute(&["apt", "update"], ExecOpts::unchecked().escalated())?;
        }
    }

    ctx.log
        .info(&format!("installing packages: {}", COMMON_PACKAGES.join(", ")));
    let mut argv = vec!["apt", "install", "-y"];
    argv.extend(COMMON_PACKAGES);
    ctx.runner.execute(&argv, ExecOpts::checked().escalated())?;

    ctx.log.success("packages installed");
    Ok(ctx.applied())
}

/// Whether a `neovim-ppa*` source file exists in `dir`.
fn neovim_ppa_present(dir: &Path) -> bool {
    std::fs::read_dir(dir).is_ok_and(|entries| {
        entries
            .filter_map(Result::ok)
            .any(|e| e.file_name().to_string_lossy().starts_with("neovim-ppa"))
    })
}
