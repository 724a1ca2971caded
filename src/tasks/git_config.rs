//! Git identity files written from prompted or configured values.
use std::fs::OpenOptions;
use std::io::Write as _;
use std::os::unix::fs::{OpenOptionsExt as _, PermissionsExt as _};
use std::path::Path;

use anyhow::{Context as _, Result};

use super::{Context, Task, TaskResult};

/// Mode for files that carry an identity.
const PRIVATE_MODE: u32 = 0o600;

/// Git identity resolved from configuration and prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    /// `user.name`.
    pub name: String,
    /// `user.email`.
    pub email: String,
    /// Email used for work repositories; empty when unset.
    pub work_email: String,
    /// Remote URL glob selecting work repositories; empty when unset.
    pub work_remote_pattern: String,
}

/// Render `~/.gitconfig`.
///
/// The work include is emitted only when both the work email and the
/// remote pattern are set.
#[must_use]
pub fn render_gitconfig(identity: &Identity) -> String {
    let mut out = format!(
        "[init]\n    defaultBranch = main\n\n[user]\n    name = {}\n    email = {}\n",
        identity.name, identity.email
    );
    if !identity.work_email.is_empty() && !identity.work_remote_pattern.is_empty() {
        out.push_str(&format!(
            "\n[includeIf \"hasconfig:remote.*.url:{}\"]\n    path = ~/.gitconfig-work\n",
            identity.work_remote_pattern
        ));
    }
    out
}

/// Render `~/.gitconfig-work`.
#[must_use]
pub fn render_work_gitconfig(work_email: &str) -> String {
    format!("[user]\n    email = {work_email}\n")
}

/// Write `content` to `path`, readable only by the owner.
fn write_private(path: &Path, content: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(PRIVATE_MODE)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("writing {}", path.display()))?;
    // mode() only applies on creation
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(PRIVATE_MODE))
        .with_context(|| format!("setting permissions on {}", path.display()))?;
    Ok(())
}

/// Create `~/.gitconfig` and, for a work profile, `~/.gitconfig-work`.
#[derive(Debug)]
pub struct ConfigureGit;

impl ConfigureGit {
    /// Fill gaps in the configured identity by asking the user.
    fn prompt_identity(ctx: &Context) -> Result<Identity> {
        let git = &ctx.config.git;
        let name = match &git.name {
            Some(name) => name.clone(),
            None => ctx.prompt.input("Git user name")?,
        };
        let email = match &git.email {
            Some(email) => email.clone(),
            None => ctx.prompt.input("Git user email")?,
        };

        let mut work_email = git.work_email.clone().unwrap_or_default();
        let mut work_remote_pattern = git.work_remote_pattern.clone().unwrap_or_default();
        if work_email.is_empty() && ctx.prompt.confirm("Configure work git profile?", false)? {
            work_email = ctx.prompt.input("Work email")?;
            work_remote_pattern = ctx
                .prompt
                .input("Work remote pattern (e.g., gitlab.company.com*/**)")?;
        }

        Ok(Identity {
            name,
            email,
            work_email,
            work_remote_pattern,
        })
    }
}

impl Task for ConfigureGit {
    fn name(&self) -> &'static str {
        "Configure git identity"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let gitconfig = ctx.home().join(".gitconfig");
        let gitconfig_work = ctx.home().join(".gitconfig-work");
        if gitconfig.exists() {
            return Ok(TaskResult::Skipped(".gitconfig already exists".to_string()));
        }

        let identity = if ctx.dry_run() {
            ctx.log.info("would prompt for git configuration");
            Identity {
                name: "User".to_string(),
                email: "user@example.com".to_string(),
                ..Identity::default()
            }
        } else {
            Self::prompt_identity(ctx)?
        };

        if identity.name.is_empty() || identity.email.is_empty() {
            ctx.log
                .warn("git name/email not provided, skipping .gitconfig creation");
            return Ok(TaskResult::Skipped("no git identity".to_string()));
        }

        if ctx.dry_run() {
            ctx.log.dry_run(&format!("write {}", gitconfig.display()));
        } else {
            write_private(&gitconfig, &render_gitconfig(&identity))?;
            ctx.log.success(".gitconfig created");
        }

        if !identity.work_email.is_empty() && !gitconfig_work.exists() {
            if ctx.dry_run() {
                ctx.log.dry_run(&format!("write {}", gitconfig_work.display()));
            } else {
                write_private(&gitconfig_work, &render_work_gitconfig(&identity.work_email))?;
                ctx.log.success(".gitconfig-work created");
            }
        }

        Ok(ctx.applied())
    }
}
