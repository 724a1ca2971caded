//! Read-only installation report.
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::error::DotfilesError;
use crate::exec::{ExecutionMode, Executor, Runner};
use crate::interrupt::Interrupt;
use crate::logging::Logger;

/// One row of the component table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentStatus {
    /// Display name.
    pub name: &'static str,
    /// Whether the component was found.
    pub installed: bool,
    /// Install location, when it is a directory under home.
    pub info: Option<String>,
}

/// One row of the stowed-config table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkStatus {
    /// Path relative to home.
    pub name: &'static str,
    /// Whether the path is a symlink.
    pub linked: bool,
}

/// Everything `status` reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Tools and frameworks.
    pub components: Vec<ComponentStatus>,
    /// Stow-managed configuration links.
    pub links: Vec<LinkStatus>,
    /// Login shell from `$SHELL`.
    pub shell: String,
    /// Detected distribution.
    pub distro: String,
}

/// Inspect the machine. Read-only.
#[must_use]
pub fn collect(config: &Config, executor: &dyn Executor) -> StatusReport {
    let paths = &config.paths;
    let cmd = |name, program: &str| ComponentStatus {
        name,
        installed: executor.command_exists(program),
        info: None,
    };

    let components = vec![
        dir_status("Oh My Zsh", &paths.oh_my_zsh_dir, true),
        dir_status(
            "Powerlevel10k",
            &paths.oh_my_zsh_custom.join("themes/powerlevel10k"),
            false,
        ),
        dir_status("Proto", &paths.proto_home, true),
        cmd("uv", "uv"),
        dir_status("TPM", &paths.tpm_dir, false),
        cmd("Bun", "bun"),
        cmd("GitHub CLI", "gh"),
        cmd("Claude Code", "claude"),
        cmd("Neovim", "nvim"),
        cmd("Zsh", "zsh"),
        cmd("Stow", "stow"),
    ];

    let links = [".zshrc", ".tmux.conf", ".config/nvim", ".claude"]
        .into_iter()
        .map(|name| LinkStatus {
            name,
            linked: config.home.join(name).is_symlink(),
        })
        .collect();

    StatusReport {
        components,
        links,
        shell: config
            .shell
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
        distro: config.distro.to_string(),
    }
}

fn dir_status(name: &'static str, path: &Path, show_path: bool) -> ComponentStatus {
    ComponentStatus {
        name,
        installed: path.exists(),
        info: show_path.then(|| path.display().to_string()),
    }
}

/// Render the report as aligned plain-text lines.
#[must_use]
pub fn render(report: &StatusReport) -> Vec<String> {
    let mut lines = vec![format!("{:<18}{:<12}{}", "Component", "Status", "Path/Info")];
    for c in &report.components {
        let status = if c.installed { "Installed" } else { "Missing" };
        lines.push(
            format!(
                "{:<18}{:<12}{}",
                c.name,
                status,
                c.info.as_deref().unwrap_or_default()
            )
            .trim_end()
            .to_string(),
        );
    }
    lines.push(String::new());
    lines.push("Stowed Configs".to_string());
    for l in &report.links {
        let status = if l.linked { "Linked" } else { "Not linked" };
        lines.push(format!("  {:<16}{status}", l.name));
    }
    lines.push(String::new());
    lines.push(format!("Current shell: {}", report.shell));
    lines.push(format!("Detected distro: {}", report.distro));
    lines
}

/// Run the status command.
///
/// # Errors
///
/// Returns [`DotfilesError::Config`] if configuration cannot be loaded.
pub fn run(log: &Arc<Logger>) -> Result<()> {
    let config = Config::from_env().map_err(DotfilesError::from)?;
    let runner = Runner::new(ExecutionMode::default(), log.clone(), Interrupt::default());

    log.stage("Dotfiles status");
    for line in render(&collect(&config, &runner)) {
        log.info(&line);
    }
    Ok(())
}
