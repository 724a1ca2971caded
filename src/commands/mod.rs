//! Top-level subcommand orchestration.
pub mod completions;
pub mod install;
pub mod status;
pub mod sync;
pub mod uninstall;

use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::error::DotfilesError;
use crate::exec::{ExecutionMode, Runner};
use crate::interrupt::Interrupt;
use crate::logging::Logger;
use crate::prompt::Prompt;
use crate::tasks::{self, Context, Phase};

/// Load configuration and build the task context for a pipeline command.
///
/// # Errors
///
/// Returns [`DotfilesError::Config`] if the home directory cannot be
/// determined or the config file is invalid.
pub fn build_context(
    mode: ExecutionMode,
    log: &Arc<Logger>,
    interrupt: &Interrupt,
    prompt: Arc<dyn Prompt>,
) -> Result<Context> {
    let config = Config::from_env().map_err(DotfilesError::from)?;
    log.debug(&format!("home: {}", config.home.display()));
    log.debug(&format!("dotfiles: {}", config.dotfiles_dir.display()));
    log.debug(&format!("distro: {}", config.distro));

    let runner = Runner::new(mode, log.clone(), interrupt.clone());
    Ok(Context::new(
        Arc::new(config),
        Arc::new(runner),
        log.clone(),
        prompt,
        mode,
        interrupt.clone(),
    ))
}

/// Execute phases in order, stopping at the first fatal error.
///
/// The summary is printed whether the run completes or stops early.
///
/// # Errors
///
/// Returns the first fatal task error, or [`DotfilesError::Interrupted`]
/// when Ctrl-C was pressed between tasks.
pub fn run_phases(phases: &[Phase], ctx: &Context, log: &Logger) -> Result<()> {
    if ctx.dry_run() {
        log.info("dry run: no changes will be made");
    }

    let result = run_all(phases, ctx);
    log.print_summary();
    result
}

fn run_all(phases: &[Phase], ctx: &Context) -> Result<()> {
    let total = phases.len();
    for (i, phase) in phases.iter().enumerate() {
        if total > 1 {
            ctx.log
                .stage(&format!("Phase {}/{total}: {}", i + 1, phase.title));
        }
        for task in &phase.tasks {
            if ctx.interrupt.is_set() {
                return Err(DotfilesError::Interrupted.into());
            }
            tasks::execute(task.as_ref(), ctx)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::is_interrupted;
    use crate::logging::{TaskStatus, isolated_logger};
    use crate::tasks::test_helpers::TestEnv;
    use crate::tasks::{Task, TaskResult};

    #[derive(Debug)]
    struct Succeeds;

    impl Task for Succeeds {
        fn name(&self) -> &'static str {
            "succeeds"
        }
        fn run(&self, _ctx: &Context) -> Result<TaskResult> {
            Ok(TaskResult::Ok)
        }
    }

    #[derive(Debug)]
    struct Fails;

    impl Task for Fails {
        fn name(&self) -> &'static str {
            "fails"
        }
        fn run(&self, _ctx: &Context) -> Result<TaskResult> {
            anyhow::bail!("boom")
        }
    }

    #[derive(Debug)]
    struct Interrupts;

    impl Task for Interrupts {
        fn name(&self) -> &'static str {
            "interrupts"
        }
        fn run(&self, ctx: &Context) -> Result<TaskResult> {
            ctx.interrupt.trigger();
            Ok(TaskResult::Ok)
        }
    }

    fn phase(title: &'static str, tasks: Vec<Box<dyn Task>>) -> Phase {
        Phase { title, tasks }
    }

    #[test]
    fn first_fatal_error_stops_the_run() {
        let env = TestEnv::new();
        let ctx = env.context();
        let (log, _tmp, _guard) = isolated_logger();
        let phases = vec![
            phase("one", vec![Box::new(Fails)]),
            phase("two", vec![Box::new(Succeeds)]),
        ];

        let err = run_phases(&phases, &ctx, &log).unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(
            env.log.statuses(),
            vec![("fails".to_string(), TaskStatus::Failed)]
        );
    }

    #[test]
    fn interrupt_is_checked_before_each_task() {
        let env = TestEnv::new();
        let ctx = env.context();
        let (log, _tmp, _guard) = isolated_logger();
        let phases = vec![phase(
            "only",
            vec![Box::new(Interrupts), Box::new(Succeeds)],
        )];

        let err = run_phases(&phases, &ctx, &log).unwrap_err();
        assert!(is_interrupted(&err));
        assert_eq!(env.log.statuses().len(), 1);
    }

    #[test]
    fn phases_are_staged_in_order() {
        let env = TestEnv::new();
        let ctx = env.context();
        let (log, _tmp, _guard) = isolated_logger();
        let phases = vec![
            phase("first", vec![Box::new(Succeeds)]),
            phase("second", vec![]),
        ];

        run_phases(&phases, &ctx, &log).unwrap();
        assert_eq!(
            env.log.messages("stage"),
            vec!["Phase 1/2: first", "succeeds", "Phase 2/2: second"]
        );
    }
}
