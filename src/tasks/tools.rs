//! proto, the tools it manages, and the tmux plugin manager.
use anyhow::{Context as _, Result};

use super::{Context, Task, TaskResult};
use crate::exec::ExecOpts;

/// proto installer, non-interactive.
const PROTO_INSTALL: &str = "curl -fsSL https://moonrepo.dev/install/proto.sh | bash -s -- --yes";

/// Tmux Plugin Manager repository.
const TPM_REPO: &str = "https://github.com/tmux-plugins/tpm.git";

/// Version requested for tools that simply track the newest release.
const LATEST: &str = "latest";

/// Tools managed by proto besides Node.js.
const PROTO_TOOLS: &[&str] = &["bun", "uv", "gh"];

/// Install the proto toolchain manager.
#[derive(Debug)]
pub struct InstallProto;

impl Task for InstallProto {
    fn name(&self) -> &'static str {
        "Install proto"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if ctx.paths().proto_bin.exists() {
            return Ok(TaskResult::Skipped("proto already installed".to_string()));
        }
        ctx.log.info("installing proto toolchain manager");
        ctx.runner.execute_shell(PROTO_INSTALL, ExecOpts::checked())?;
        ctx.log.success("proto installed");
        Ok(ctx.applied())
    }
}

/// Install and globally pin Node.js, bun, uv, and gh through proto.
#[derive(Debug)]
pub struct InstallProtoTools;

impl InstallProtoTools {
    fn wanted(ctx: &Context) -> Vec<(&'static str, String)> {
        std::iter::once(("node", ctx.config.node_version.clone()))
            .chain(PROTO_TOOLS.iter().map(|t| (*t, LATEST.to_string())))
            .collect()
    }
}

impl Task for InstallProtoTools {
    fn name(&self) -> &'static str {
        "Install proto tools"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let proto_bin = &ctx.paths().proto_bin;
        if !proto_bin.exists() {
            return Ok(TaskResult::Skipped("proto not installed".to_string()));
        }
        let proto = proto_bin.to_string_lossy();

        let mut installed = 0usize;
        for (tool, version) in Self::wanted(ctx) {
            let listing = ctx
                .runner
                .execute(&[&proto, "list", tool], ExecOpts::unchecked().captured())?;
            if listing.success() && lists_version(&listing.stdout, &version) {
                ctx.log.skip(&format!("{tool} {version} already installed"));
                continue;
            }

            ctx.log.info(&format!("installing {tool} {version} via proto"));
            ctx.runner
                .execute(&[&proto, "install", tool, &version], ExecOpts::checked())?;
            ctx.runner.execute(
                &[&proto, "pin", "--global", tool, &version],
                ExecOpts::checked(),
            )?;
            ctx.log.success(&format!("{tool} {version} installed"));
            installed += 1;
        }

        if installed == 0 {
            Ok(TaskResult::Skipped("all proto tools already installed".to_string()))
        } else {
            Ok(ctx.applied())
        }
    }
}

/// Whether `proto list` output shows `version`.
///
/// `latest` matches any installed version; otherwise a listed version
/// matches when it equals `version` or starts with `version.`.
fn lists_version(output: &str, version: &str) -> bool {
    let mut versions = output
        .lines()
        .map(|l| l.trim().trim_start_matches('v'))
        .filter(|l| !l.is_empty());
    if version == LATEST {
        return versions.next().is_some();
    }
    let wanted = version.trim_start_matches('v');
    versions.any(|v| v == wanted || v.starts_with(&format!("{wanted}.")))
}

/// Install the Tmux Plugin Manager.
#[derive(Debug)]
pub struct InstallTpm;

impl Task for InstallTpm {
    fn name(&self) -> &'static str {
        "Install TPM"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let tpm_dir = &ctx.paths().tpm_dir;
        if tpm_dir.exists() {
            return Ok(TaskResult::Skipped("TPM already installed".to_string()));
        }
        ctx.log.info("installing TPM");
        if !ctx.dry_run()
            && let Some(parent) = tpm_dir.parent()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let dest = tpm_dir.to_string_lossy();
        ctx.runner
            .execute(&["git", "clone", TPM_REPO, &dest], ExecOpts::checked())?;
        ctx.log.success("TPM installed");
        Ok(ctx.applied())
    }
}

/// Pull the latest TPM commits.
#[derive(Debug)]
pub struct UpdateTpm;

impl Task for UpdateTpm {
    fn name(&self) -> &'static str {
        "Update TPM"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let tpm_dir = &ctx.paths().tpm_dir;
        if !tpm_dir.exists() {
            return Ok(TaskResult::Skipped("TPM not installed".to_string()));
        }
        ctx.log.info("updating TPM");
        let dir = tpm_dir.to_string_lossy();
        let result = ctx.runner.execute(
            &["git", "-C", &dir, "pull", "--rebase"],
            ExecOpts::unchecked(),
        )?;
        if result.success() {
            ctx.log.success("TPM updated");
        } else {
            ctx.log.warn("could not update TPM");
        }
        Ok(ctx.applied())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::tasks::test_helpers::{RecordingExecutor, TestEnv, mkdir};

    fn touch_proto(ctx: &Context) {
        let bin = &ctx.paths().proto_bin;
        mkdir(bin.parent().unwrap());
        std::fs::write(bin, "").unwrap();
    }

    #[test]
    fn proto_installs_then_skips() {
        let env = TestEnv::new();
        let ctx = env.context();
        assert_eq!(InstallProto.run(&ctx).unwrap(), TaskResult::Ok);
        assert!(env.executor.calls()[0].contains("moonrepo.dev/install/proto.sh"));

        touch_proto(&ctx);
        assert!(matches!(
            InstallProto.run(&ctx).unwrap(),
            TaskResult::Skipped(_)
        ));
        assert_eq!(env.executor.calls().len(), 1);
    }

    #[test]
    fn proto_tools_skip_without_proto() {
        let env = TestEnv::new();
        assert_eq!(
            InstallProtoTools.run(&env.context()).unwrap(),
            TaskResult::Skipped("proto not installed".to_string())
        );
    }

    #[test]
    fn proto_tools_install_missing_and_pin() {
        let env = TestEnv::with_executor(
            RecordingExecutor::new()
                .respond(0, "")
                .respond(0, "")
                .respond(0, "")
                .respond(0, "1.2.0\n")
                .respond(0, "0.5.0\n")
                .respond(0, "2.60.0\n"),
        );
        let ctx = env.context();
        touch_proto(&ctx);

        assert_eq!(InstallProtoTools.run(&ctx).unwrap(), TaskResult::Ok);
        let calls = env.executor.calls();
        assert!(calls[0].ends_with("proto list node"));
        assert!(calls[1].ends_with("proto install node 23"));
        assert!(calls[2].ends_with("proto pin --global node 23"));
        assert!(calls[3].ends_with("proto list bun"));
        assert_eq!(calls.len(), 6);
        assert_eq!(env.log.messages("skip").len(), 3);
    }

    #[test]
    fn proto_tools_second_run_skips() {
        let env = TestEnv::with_executor(
            RecordingExecutor::new()
                .respond(0, "23.11.0\n")
                .respond(0, "1.2.0\n")
                .respond(0, "0.5.0\n")
                .respond(0, "2.60.0\n"),
        );
        let ctx = env.context();
        touch_proto(&ctx);
        assert!(matches!(
            InstallProtoTools.run(&ctx).unwrap(),
            TaskResult::Skipped(_)
        ));
        assert_eq!(env.executor.calls().len(), 4);
    }

    #[test]
    fn version_matching() {
        assert!(lists_version("23.11.0\n", "23"));
        assert!(lists_version("v23.11.0\n", "23"));
        assert!(lists_version("23\n", "23"));
        assert!(!lists_version("230.1.0\n", "23"));
        assert!(!lists_version("22.1.0\n", "23"));
        assert!(lists_version("1.0.0\n", LATEST));
        assert!(!lists_version("  \n", LATEST));
    }

    #[test]
    fn tpm_clones_into_new_parent() {
        let env = TestEnv::new();
        let ctx = env.context();
        assert_eq!(InstallTpm.run(&ctx).unwrap(), TaskResult::Ok);
        assert!(ctx.paths().tpm_dir.parent().unwrap().is_dir());
        assert!(env.executor.calls()[0].starts_with("git clone https://github.com/tmux-plugins/tpm.git"));
    }

    #[test]
    fn tpm_second_run_skips() {
        let env = TestEnv::new();
        let ctx = env.context();
        mkdir(&ctx.paths().tpm_dir);
        assert!(matches!(InstallTpm.run(&ctx).unwrap(), TaskResult::Skipped(_)));
        assert!(env.executor.calls().is_empty());
    }

    #[test]
    fn update_tpm_warns_on_failure() {
        let env = TestEnv::with_executor(RecordingExecutor::new().respond(1, ""));
        let ctx = env.context();
        mkdir(&ctx.paths().tpm_dir);
        assert_eq!(UpdateTpm.run(&ctx).unwrap(), TaskResult::Ok);
        assert_eq!(env.log.messages("warn"), vec!["could not update TPM"]);
    }
}
