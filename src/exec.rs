//! Command runner: the only place that spawns external processes.
//!
//! Every external call made by a task goes through an [`Executor`]. The
//! production [`Runner`] owns dry-run suppression, verbose logging, and the
//! once-per-run privilege escalation check.
use std::fmt;
use std::process::{Command, ExitStatus, Output, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::RunnerError;
use crate::interrupt::Interrupt;
use crate::logging::Log;

/// Maximum number of script characters shown in a dry-run preview.
const SHELL_PREVIEW_LEN: usize = 80;

/// Interpreter used by [`Executor::execute_shell`].
const SHELL: &str = "bash";

/// Per-call execution options.
///
/// The default is a checked call without escalation or capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ExecOpts {
    /// Run through the escalation prefix (`sudo`).
    pub escalate: bool,
    /// Fail with [`RunnerError::CommandFailed`] on a non-zero exit.
    pub check: bool,
    /// Capture stdout and stderr instead of inheriting the terminal.
    pub capture: bool,
}

impl Default for ExecOpts {
    fn default() -> Self {
        Self::checked()
    }
}

impl ExecOpts {
    /// Checked call; a non-zero exit is an error.
    #[must_use]
    pub const fn checked() -> Self {
        Self {
            escalate: false,
            check: true,
            capture: false,
        }
    }

    /// Unchecked call; the exit code is returned to the caller.
    #[must_use]
    pub const fn unchecked() -> Self {
        Self {
            escalate: false,
            check: false,
            capture: false,
        }
    }

    /// Request privilege escalation.
    #[must_use]
    pub const fn escalated(mut self) -> Self {
        self.escalate = true;
        self
    }

    /// Request output capture.
    #[must_use]
    pub const fn captured(mut self) -> Self {
        self.capture = true;
        self
    }
}

/// Result of a command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Exit code; `128 + signal` when the process was killed by a signal.
    pub code: i32,
    /// Captured standard output (empty unless capture was requested).
    pub stdout: String,
    /// Captured standard error (empty unless capture was requested).
    pub stderr: String,
}

impl ExecResult {
    /// Whether the process exited with code 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.code == 0
    }
}

/// Process-wide execution flags, fixed for one command invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionMode {
    /// Preview commands instead of running them.
    pub dry_run: bool,
    /// Log every command before it runs.
    pub verbose: bool,
}

/// How privileged commands are run and how credentials are validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Escalation {
    prefix: Vec<String>,
    validate: Vec<String>,
}

impl Default for Escalation {
    fn default() -> Self {
        Self::new(
            vec!["sudo".to_string()],
            vec!["sudo".to_string(), "-v".to_string()],
        )
    }
}

impl Escalation {
    /// Build an escalation from a command prefix and a validation command.
    ///
    /// An empty `validate` vector means credentials never need checking.
    #[must_use]
    pub const fn new(prefix: Vec<String>, validate: Vec<String>) -> Self {
        Self { prefix, validate }
    }
}

/// Abstraction over process execution so tasks can be tested with a double.
pub trait Executor: Send + Sync + fmt::Debug {
    /// Run `argv` (program plus arguments, never a shell string).
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::CommandFailed`] when `opts.check` is set and the
    /// process exits non-zero, [`RunnerError::EscalationFailed`] when
    /// credentials cannot be validated, and [`RunnerError::Spawn`] when the
    /// program cannot be started.
    fn execute(&self, argv: &[&str], opts: ExecOpts) -> Result<ExecResult, RunnerError>;

    /// Run `script` as the single argument of `bash -c`. Output is always
    /// captured.
    ///
    /// # Errors
    ///
    /// Same as [`Executor::execute`].
    fn execute_shell(&self, script: &str, opts: ExecOpts) -> Result<ExecResult, RunnerError>;

    /// Whether `name` resolves to an executable on `PATH`.
    fn command_exists(&self, name: &str) -> bool;
}

/// The production [`Executor`].
///
/// One runner is built per command invocation; it caches a successful
/// escalation check for its own lifetime.
pub struct Runner {
    mode: ExecutionMode,
    log: Arc<dyn Log>,
    interrupt: Interrupt,
    escalation: Escalation,
    escalation_validated: AtomicBool,
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("mode", &self.mode)
            .field("escalation", &self.escalation)
            .field("escalation_validated", &self.is_escalation_validated())
            .finish_non_exhaustive()
    }
}

impl Runner {
    /// Create a runner that escalates with `sudo`.
    #[must_use]
    pub fn new(mode: ExecutionMode, log: Arc<dyn Log>, interrupt: Interrupt) -> Self {
        Self {
            mode,
            log,
            interrupt,
            escalation: Escalation::default(),
            escalation_validated: AtomicBool::new(false),
        }
    }

    /// Replace the escalation mechanism.
    #[must_use]
    pub fn with_escalation(mut self, escalation: Escalation) -> Self {
        self.escalation = escalation;
        self
    }

    /// Execution mode this runner was built with.
    #[must_use]
    pub const fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Whether escalation has been validated during this runner's lifetime.
    #[must_use]
    pub fn is_escalation_validated(&self) -> bool {
        self.escalation_validated.load(Ordering::SeqCst)
    }

    fn ensure_escalation(&self) -> Result<(), RunnerError> {
        if self.is_escalation_validated() {
            return Ok(());
        }
        if self.mode.dry_run {
            self.log.dry_run("would prompt for sudo password");
            self.escalation_validated.store(true, Ordering::SeqCst);
            return Ok(());
        }
        if let Some((program, args)) = self.escalation.validate.split_first() {
            self.log.debug(&format!(
                "validating privileges: {}",
                render_command(&self.escalation.validate)
            ));
            let output = Command::new(program)
                .args(args)
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::piped())
                .output()
                .map_err(|source| RunnerError::Spawn {
                    program: program.clone(),
                    source,
                })?;
            if self.interrupt.is_set() {
                return Err(RunnerError::Interrupted);
            }
            let exit_code = exit_code(output.status);
            if exit_code != 0 {
                return Err(RunnerError::EscalationFailed {
                    exit_code,
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                });
            }
        }
        self.escalation_validated.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Prepend the escalation prefix when requested, validating first.
    fn build_argv(&self, argv: &[&str], escalate: bool) -> Result<Vec<String>, RunnerError> {
        if argv.is_empty() {
            return Err(RunnerError::EmptyCommand);
        }
        let mut full = Vec::with_capacity(argv.len() + self.escalation.prefix.len());
        if escalate {
            self.ensure_escalation()?;
            full.extend(self.escalation.prefix.iter().cloned());
        }
        full.extend(argv.iter().map(ToString::to_string));
        Ok(full)
    }

    fn run(
        &self,
        argv: Vec<String>,
        display: &str,
        opts: ExecOpts,
    ) -> Result<ExecResult, RunnerError> {
        if self.mode.dry_run {
            self.log.dry_run(display);
            return Ok(ExecResult::default());
        }

        let message = format!("running: {display}");
        if self.mode.verbose {
            self.log.info(&message);
        } else {
            self.log.debug(&message);
        }

        let Some((program, args)) = argv.split_first() else {
            return Err(RunnerError::EmptyCommand);
        };
        let mut cmd = Command::new(program);
        cmd.args(args);
        let spawned = if opts.capture {
            cmd.output()
        } else {
            cmd.status().map(|status| Output {
                status,
                stdout: Vec::new(),
                stderr: Vec::new(),
            })
        };
        let output = spawned.map_err(|source| RunnerError::Spawn {
            program: program.clone(),
            source,
        })?;

        if self.interrupt.is_set() {
            return Err(RunnerError::Interrupted);
        }

        let result = ExecResult {
            code: exit_code(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if opts.check && !result.success() {
            return Err(RunnerError::CommandFailed {
                argv,
                exit_code: result.code,
                stderr: result.stderr.trim().to_string(),
            });
        }
        Ok(result)
    }
}

impl Executor for Runner {
    fn execute(&self, argv: &[&str], opts: ExecOpts) -> Result<ExecResult, RunnerError> {
        let full = self.build_argv(argv, opts.escalate)?;
        let display = render_command(&full);
        self.run(full, &display, opts)
    }

    fn execute_shell(&self, script: &str, opts: ExecOpts) -> Result<ExecResult, RunnerError> {
        let full = self.build_argv(&[SHELL, "-c", script], opts.escalate)?;
        let prefix = if opts.escalate && !self.escalation.prefix.is_empty() {
            format!("{} ", render_command(&self.escalation.prefix))
        } else {
            String::new()
        };
        let display = format!("{prefix}{SHELL} -c '{}'", shell_preview(script));
        self.run(full, &display, opts.captured())
    }

    fn command_exists(&self, name: &str) -> bool {
        which::which(name).is_ok()
    }
}

/// Exit code of a finished process, mapping signal deaths to `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt as _;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

/// Truncate `script` for display, appending `...` when it was shortened.
fn shell_preview(script: &str) -> String {
    if script.chars().count() > SHELL_PREVIEW_LEN {
        let head: String = script.chars().take(SHELL_PREVIEW_LEN).collect();
        format!("{head}...")
    } else {
        script.to_string()
    }
}

/// Quote `arg` for display in a POSIX shell.
///
/// Arguments made only of safe characters are returned unchanged.
#[must_use]
pub fn shell_quote(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }
    let safe = arg.chars().all(|c| {
        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '=' | '@' | '+' | ',')
    });
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r#"'"'"'"#))
    }
}

/// Join `argv` into a single shell-quoted line for display only.
#[must_use]
pub fn render_command<S: AsRef<str>>(argv: &[S]) -> String {
    argv.iter()
        .map(|a| shell_quote(a.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}
