//! Named, idempotent tasks and the phase lists that sequence them.
//!
//! Every task re-derives "is this already done?" from the filesystem, `PATH`
//! lookups, or command output on each run; nothing is cached between runs.
pub mod claude;
pub mod cleanup;
mod context;
pub mod git_config;
pub mod github;
pub mod packages;
pub mod shell;
pub mod stow;
pub mod tools;
pub mod update;

pub use context::Context;

use std::fmt;

use anyhow::Result;

use crate::error::is_interrupted;
use crate::logging::TaskStatus;

/// Outcome of a task that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// The task changed something.
    Ok,
    /// Nothing to do; carries the reason.
    Skipped(String),
    /// The task would have changed something but only previewed it.
    DryRun,
}

/// A named, executable task.
pub trait Task: Send + Sync {
    /// Human-readable task name.
    fn name(&self) -> &'static str;

    /// Whether a failure should be downgraded to a warning.
    ///
    /// Best-effort tasks cover optional extras; the pipeline continues
    /// without them.
    fn best_effort(&self) -> bool {
        false
    }

    /// Execute the task.
    ///
    /// # Errors
    ///
    /// Returns an error if a required external command fails or a file
    /// cannot be written.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// An ordered group of tasks shown under one heading.
pub struct Phase {
    /// Heading printed before the phase runs.
    pub title: &'static str,
    /// Tasks in execution order.
    pub tasks: Vec<Box<dyn Task>>,
}

impl fmt::Debug for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Phase")
            .field("title", &self.title)
            .field(
                "tasks",
                &self.tasks.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Phase {
    fn new(title: &'static str, tasks: Vec<Box<dyn Task>>) -> Self {
        Self { title, tasks }
    }
}

/// Phases run by `install`.
#[must_use]
pub fn install_phases() -> Vec<Phase> {
    vec![
        Phase::new("System Packages", vec![Box::new(packages::InstallPackages)]),
        Phase::new(
            "Tools",
            vec![
                Box::new(shell::InstallOhMyZsh),
                Box::new(tools::InstallProto),
                Box::new(tools::InstallProtoTools),
                Box::new(shell::InstallZshPlugins),
                Box::new(tools::InstallTpm),
                Box::new(claude::InstallClaudeCode),
                Box::new(claude::ConfigureMcpServers),
                Box::new(claude::InstallClaudeSkills),
            ],
        ),
        Phase::new(
            "Configuration",
            vec![
                Box::new(stow::SetupDirectories),
                Box::new(git_config::ConfigureGit),
                Box::new(stow::DeployConfigs),
                Box::new(stow::LinkLocalScripts),
                Box::new(claude::WriteClaudeSettings),
            ],
        ),
        Phase::new(
            "Final Setup",
            vec![
                Box::new(shell::SetDefaultShell),
                Box::new(github::InstallGhExtensions),
            ],
        ),
    ]
}

/// Phases run by `sync`.
#[must_use]
pub fn sync_phases() -> Vec<Phase> {
    vec![Phase::new(
        "Sync",
        vec![
            Box::new(update::PullDotfiles),
            Box::new(stow::DeployConfigs),
            Box::new(shell::UpdateZshPlugins),
            Box::new(tools::UpdateTpm),
            Box::new(claude::UpdateClaudeCode),
        ],
    )]
}

/// Phases run by `uninstall`; tool removal only when `remove_tools` is set.
#[must_use]
pub fn uninstall_phases(remove_tools: bool) -> Vec<Phase> {
    let mut phases = vec![Phase::new(
        "Uninstall",
        vec![
            Box::new(stow::RemoveConfigs),
            Box::new(stow::UnlinkLocalScripts),
        ],
    )];
    if remove_tools {
        phases.push(Phase::new(
            "Remove Tools",
            vec![
                Box::new(cleanup::RemoveOhMyZsh),
                Box::new(cleanup::RemoveProto),
                Box::new(cleanup::RemoveTpm),
            ],
        ));
    }
    phases
}

/// Execute a task, recording the result in the logger.
///
/// Failures of best-effort tasks are logged as warnings and recorded as
/// skipped. Any other failure is recorded and returned.
///
/// # Errors
///
/// Returns the task's error unless the task is best-effort. Interruptions
/// are always returned.
pub fn execute(task: &dyn Task, ctx: &Context) -> Result<()> {
    ctx.log.stage(task.name());

    match task.run(ctx) {
        Ok(TaskResult::Ok) => {
            ctx.log.record_task(task.name(), TaskStatus::Ok, None);
            Ok(())
        }
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.skip(&reason);
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some(&reason));
            Ok(())
        }
        Ok(TaskResult::DryRun) => {
            ctx.log.record_task(task.name(), TaskStatus::DryRun, None);
            Ok(())
        }
        Err(e) if is_interrupted(&e) => {
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some("interrupted"));
            Err(e)
        }
        Err(e) if task.best_effort() => {
            ctx.log.warn(&format!("{}: {e:#}", task.name()));
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some(&format!("{e:#}")));
            Ok(())
        }
        Err(e) => {
            ctx.log.error(&format!("{}: {e:#}", task.name()));
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&format!("{e:#}")));
            Err(e)
        }
    }
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::RunnerError;
    use test_helpers::TestEnv;

    /// A mock task for testing `execute()`.
    struct MockTask {
        best_effort: bool,
        result: fn() -> Result<TaskResult>,
    }

    impl Task for MockTask {
        fn name(&self) -> &'static str {
            "mock"
        }
        fn best_effort(&self) -> bool {
            self.best_effort
        }
        fn run(&self, _ctx: &Context) -> Result<TaskResult> {
            (self.result)()
        }
    }

    fn mock(best_effort: bool, result: fn() -> Result<TaskResult>) -> MockTask {
        MockTask {
            best_effort,
            result,
        }
    }

    #[test]
    fn execute_records_ok_task() {
        let env = TestEnv::new();
        execute(&mock(false, || Ok(TaskResult::Ok)), &env.context()).unwrap();
        assert_eq!(env.log.statuses(), vec![("mock".to_string(), TaskStatus::Ok)]);
        assert_eq!(env.log.messages("stage"), vec!["mock".to_string()]);
    }

    #[test]
    fn execute_logs_skip_reason() {
        let env = TestEnv::new();
        execute(
            &mock(false, || Ok(TaskResult::Skipped("already done".into()))),
            &env.context(),
        )
        .unwrap();
        assert_eq!(env.log.messages("skip"), vec!["already done".to_string()]);
        let entries = env.log.entries();
        assert_eq!(entries[0].status, TaskStatus::Skipped);
        assert_eq!(entries[0].message.as_deref(), Some("already done"));
    }

    #[test]
    fn execute_records_dry_run() {
        let env = TestEnv::new();
        execute(&mock(false, || Ok(TaskResult::DryRun)), &env.context()).unwrap();
        assert_eq!(env.log.statuses()[0].1, TaskStatus::DryRun);
    }

    #[test]
    fn execute_propagates_fatal_failure() {
        let env = TestEnv::new();
        let err = execute(
            &mock(false, || Err(anyhow::anyhow!("boom"))),
            &env.context(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(env.log.statuses()[0].1, TaskStatus::Failed);
        assert_eq!(env.log.messages("error"), vec!["mock: boom".to_string()]);
    }

    #[test]
    fn execute_downgrades_best_effort_failure() {
        let env = TestEnv::new();
        execute(&mock(true, || Err(anyhow::anyhow!("boom"))), &env.context()).unwrap();
        assert_eq!(env.log.statuses()[0].1, TaskStatus::Skipped);
        assert_eq!(env.log.messages("warn"), vec!["mock: boom".to_string()]);
    }

    #[test]
    fn execute_never_downgrades_interruption() {
        let env = TestEnv::new();
        let err = execute(
            &mock(true, || Err(RunnerError::Interrupted.into())),
            &env.context(),
        )
        .unwrap_err();
        assert!(is_interrupted(&err));
        assert_eq!(env.log.statuses()[0].1, TaskStatus::Failed);
    }

    #[test]
    fn install_has_four_phases() {
        let titles: Vec<_> = install_phases().iter().map(|p| p.title).collect();
        assert_eq!(
            titles,
            vec!["System Packages", "Tools", "Configuration", "Final Setup"]
        );
    }

    #[test]
    fn uninstall_tool_removal_is_opt_in() {
        assert_eq!(uninstall_phases(false).len(), 1);
        assert_eq!(uninstall_phases(true).len(), 2);
    }

    #[test]
    fn phase_debug_lists_task_names() {
        let phases = sync_phases();
        let debug = format!("{:?}", phases[0]);
        assert!(debug.contains("Pull dotfiles"), "{debug}");
    }
}
