use std::path::Path;
use std::sync::Arc;

use crate::config::{Config, Paths};
use crate::exec::{ExecutionMode, Executor};
use crate::interrupt::Interrupt;
use crate::logging::Log;
use crate::prompt::Prompt;

use super::TaskResult;

/// Shared context for task execution.
pub struct Context {
    /// Immutable configuration built at startup.
    pub config: Arc<Config>,
    /// Command executor (the real runner, or a double in tests).
    pub runner: Arc<dyn Executor>,
    /// Output sink for progress messages and task recording.
    pub log: Arc<dyn Log>,
    /// Source of interactive answers.
    pub prompt: Arc<dyn Prompt>,
    /// Dry-run and verbose flags for this invocation.
    pub mode: ExecutionMode,
    /// Raised by the Ctrl-C handler.
    pub interrupt: Interrupt,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("runner", &self.runner)
            .field("log", &"<dyn Log>")
            .field("prompt", &"<dyn Prompt>")
            .field("mode", &self.mode)
            .field("interrupt", &self.interrupt)
            .finish()
    }
}

impl Context {
    /// Creates a new context for task execution.
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        runner: Arc<dyn Executor>,
        log: Arc<dyn Log>,
        prompt: Arc<dyn Prompt>,
        mode: ExecutionMode,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            config,
            runner,
            log,
            prompt,
            mode,
            interrupt,
        }
    }

    /// Whether changes should only be previewed.
    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.mode.dry_run
    }

    /// User home directory.
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.config.home
    }

    /// Derived paths.
    #[must_use]
    pub fn paths(&self) -> &Paths {
        &self.config.paths
    }

    /// Result for a task that acted: [`TaskResult::DryRun`] when previewing.
    #[must_use]
    pub const fn applied(&self) -> TaskResult {
        if self.mode.dry_run {
            TaskResult::DryRun
        } else {
            TaskResult::Ok
        }
    }
}
