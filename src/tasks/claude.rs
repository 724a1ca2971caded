//! Claude Code, its MCP servers, skills, and default settings.
use anyhow::{Context as _, Result, bail};
use serde::Serialize;

use super::{Context, Task, TaskResult};
use crate::exec::ExecOpts;

/// npm package providing the `claude` CLI.
const CLAUDE_PACKAGE: &str = "@anthropic-ai/claude-code";

/// How an MCP server is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Remote server over streamable HTTP; the target is a URL.
    Http,
    /// Local process over stdio; the target is a command line.
    Stdio,
}

/// MCP servers registered at user scope: name, transport, URL or command.
pub const MCP_SERVERS: &[(&str, Transport, &str)] = &[
    ("context7", Transport::Http, "https://mcp.context7.com/mcp"),
    ("sentry", Transport::Http, "https://mcp.sentry.dev/mcp"),
    (
        "playwright",
        Transport::Stdio,
        "npx @playwright/mcp@latest --headless",
    ),
];

/// Plugin marketplace repository providing the skills below.
pub const SKILLS_MARKETPLACE: &str = "anthropics/skills";

/// Name the marketplace registers itself under.
const SKILLS_MARKETPLACE_NAME: &str = "anthropic-agent-skills";

/// Skills installed from the marketplace.
pub const SKILLS: &[&str] = &["frontend-design", "webapp-testing"];

/// Resolve the bun binary managed by proto.
///
/// In dry-run the runner returns no output, so a bare `bun` stands in for
/// the preview.
fn bun_path(ctx: &Context) -> Result<String> {
    let proto_bin = &ctx.paths().proto_bin;
    if !proto_bin.exists() {
        bail!("proto not installed");
    }
    let proto = proto_bin.to_string_lossy();
    let result = ctx
        .runner
        .execute(&[&proto, "bin", "bun"], ExecOpts::unchecked().captured())?;
    let path = result.stdout.trim();
    if ctx.dry_run() && path.is_empty() {
        return Ok("bun".to_string());
    }
    if !result.success() || path.is_empty() {
        bail!("could not find bun via proto");
    }
    Ok(path.to_string())
}

/// Install the Claude Code CLI globally with proto's bun.
#[derive(Debug)]
pub struct InstallClaudeCode;

impl Task for InstallClaudeCode {
    fn name(&self) -> &'static str {
        "Install Claude Code"
    }

    fn best_effort(&self) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if ctx.runner.command_exists("claude") {
            return Ok(TaskResult::Skipped("Claude Code already installed".to_string()));
        }
        if !ctx.paths().proto_bin.exists() {
            return Ok(TaskResult::Skipped(
                "proto not installed, cannot install Claude Code".to_string(),
            ));
        }
        ctx.log.info("installing Claude Code via bun");
        let bun = bun_path(ctx)?;
        let result = ctx
            .runner
            .execute(&[&bun, "install", "-g", CLAUDE_PACKAGE], ExecOpts::unchecked())?;
        if !result.success() {
            bail!("failed to install Claude Code (exit {})", result.code);
        }
        ctx.log.success("Claude Code installed");
        Ok(ctx.applied())
    }
}

/// Update the Claude Code CLI.
#[derive(Debug)]
pub struct UpdateClaudeCode;

impl Task for UpdateClaudeCode {
    fn name(&self) -> &'static str {
        "Update Claude Code"
    }

    fn best_effort(&self) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if !ctx.runner.command_exists("claude") {
            return Ok(TaskResult::Skipped("Claude Code not installed".to_string()));
        }
        ctx.log.info("updating Claude Code");
        let bun = bun_path(ctx)?;
        let result = ctx
            .runner
            .execute(&[&bun, "update", "-g", CLAUDE_PACKAGE], ExecOpts::unchecked())?;
        if !result.success() {
            bail!("failed to update Claude Code (exit {})", result.code);
        }
        ctx.log.success("Claude Code updated");
        Ok(ctx.applied())
    }
}

/// Build the `claude mcp add` command line for one server.
fn mcp_add_argv<'a>(name: &'a str, transport: Transport, target: &'a str) -> Vec<&'a str> {
    let mut argv = vec!["claude", "mcp", "add", "--transport"];
    match transport {
        Transport::Http => argv.extend(["http", "--scope", "user", name, target]),
        Transport::Stdio => {
            argv.extend(["stdio", "--scope", "user", name, "--"]);
            argv.extend(target.split_whitespace());
        }
    }
    argv
}

/// Register MCP servers with Claude Code.
#[derive(Debug)]
pub struct ConfigureMcpServers;

impl Task for ConfigureMcpServers {
    fn name(&self) -> &'static str {
        "Configure MCP servers"
    }

    fn best_effort(&self) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if !ctx.runner.command_exists("claude") {
            return Ok(TaskResult::Skipped("Claude Code not installed".to_string()));
        }

        let listing = ctx.runner.execute(
            &["claude", "mcp", "list"],
            ExecOpts::unchecked().captured(),
        )?;
        let configured: Vec<&str> = listing
            .stdout
            .lines()
            .filter_map(|l| l.split_once(':').map(|(name, _)| name.trim()))
            .collect();

        let mut added = 0usize;
        for &(name, transport, target) in MCP_SERVERS {
            if configured.contains(&name) {
                ctx.log.skip(&format!("{name} MCP server already configured"));
                continue;
            }
            ctx.log.info(&format!("adding MCP server: {name}"));
            let result = ctx
                .runner
                .execute(&mcp_add_argv(name, transport, target), ExecOpts::unchecked())?;
            if result.success() {
                ctx.log.success(&format!("{name} MCP server configured"));
                added += 1;
            } else {
                ctx.log
                    .skip(&format!("{name} MCP server already configured or failed"));
            }
        }

        if added == 0 {
            Ok(TaskResult::Skipped("no MCP servers added".to_string()))
        } else {
            Ok(ctx.applied())
        }
    }
}

/// Add the Anthropic skills marketplace and install selected skills.
#[derive(Debug)]
pub struct InstallClaudeSkills;

impl Task for InstallClaudeSkills {
    fn name(&self) -> &'static str {
        "Install Claude skills"
    }

    fn best_effort(&self) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if !ctx.runner.command_exists("claude") {
            return Ok(TaskResult::Skipped("Claude Code not installed".to_string()));
        }

        let marketplaces = ctx.runner.execute(
            &["claude", "plugin", "marketplace", "list"],
            ExecOpts::unchecked().captured(),
        )?;
        let plugins = ctx
            .runner
            .execute(&["claude", "plugin", "list"], ExecOpts::unchecked().captured())?;

        let mut changed = 0usize;
        if marketplaces.stdout.contains(SKILLS_MARKETPLACE_NAME) {
            ctx.log.skip("skills marketplace already added");
        } else {
            ctx.log
                .info(&format!("adding marketplace: {SKILLS_MARKETPLACE}"));
            let result = ctx.runner.execute(
                &["claude", "plugin", "marketplace", "add", SKILLS_MARKETPLACE],
                ExecOpts::unchecked(),
            )?;
            if result.success() {
                ctx.log.success("skills marketplace added");
                changed += 1;
            } else {
                ctx.log.skip("marketplace already added or failed");
            }
        }

        for skill in SKILLS {
            if plugin_listed(&plugins.stdout, skill) {
                ctx.log.skip(&format!("{skill} already installed"));
                continue;
            }
            ctx.log.info(&format!("installing skill: {skill}"));
            let plugin = format!("{skill}@{SKILLS_MARKETPLACE_NAME}");
            let result = ctx
                .runner
                .execute(&["claude", "plugin", "install", &plugin], ExecOpts::unchecked())?;
            if result.success() {
                ctx.log.success(&format!("{skill} installed"));
                changed += 1;
            } else {
                ctx.log.skip(&format!("{skill} already installed or failed"));
            }
        }

        if changed == 0 {
            Ok(TaskResult::Skipped("skills already installed".to_string()))
        } else {
            Ok(ctx.applied())
        }
    }
}

/// Whether `claude plugin list` output names `skill` from the skills
/// marketplace.
fn plugin_listed(listing: &str, skill: &str) -> bool {
    let qualified = format!("{skill}@{SKILLS_MARKETPLACE_NAME}");
    listing.lines().any(|line| {
        line.split_whitespace()
            .any(|word| word == qualified || word == skill)
    })
}

/// Default `~/.claude/settings.json`.
#[derive(Debug, Serialize)]
struct ClaudeSettings {
    #[serde(rename = "$schema")]
    schema: &'static str,
    permissions: Permissions,
}

#[derive(Debug, Serialize)]
struct Permissions {
    allow: Vec<&'static str>,
    deny: Vec<&'static str>,
}

impl Default for ClaudeSettings {
    fn default() -> Self {
        Self {
            schema: "https://json.schemastore.org/claude-code-settings.json",
            permissions: Permissions {
                allow: Vec::new(),
                deny: vec!["Read(./.env)", "Read(./.env.*)", "Read(./secrets/**)"],
            },
        }
    }
}

/// Write the default Claude Code settings file unless one exists.
#[derive(Debug)]
pub struct WriteClaudeSettings;

impl Task for WriteClaudeSettings {
    fn name(&self) -> &'static str {
        "Write Claude settings"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let path = &ctx.paths().claude_settings;
        if path.exists() || path.is_symlink() {
            return Ok(TaskResult::Skipped(format!(
                "{} already exists",
                path.display()
            )));
        }
        if ctx.dry_run() {
            ctx.log.dry_run(&format!("write {}", path.display()));
            return Ok(TaskResult::DryRun);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut json = serde_json::to_string_pretty(&ClaudeSettings::default())
            .context("serializing Claude settings")?;
        json.push('\n');
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        ctx.log.success(&format!("{} created", path.display()));
        Ok(TaskResult::Ok)
    }
}
