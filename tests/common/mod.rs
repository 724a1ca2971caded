// Shared helpers for integration tests.
//
// Provides a temporary home and dotfiles checkout plus a preconfigured
// `Command` for the compiled binary, so each test runs in isolation from the
// developer's real environment.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::{Arc, Mutex};

use dotfiles_cli::logging::{Log, TaskStatus};

/// An isolated machine layout backed by a [`tempfile::TempDir`].
pub struct TestMachine {
    /// Keeps the temporary directory alive.
    pub root: tempfile::TempDir,
}

impl TestMachine {
    /// Create empty `home/`, `dotfiles/config/`, `xdg-config/`, `xdg-cache/`.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        for dir in ["home", "dotfiles/config", "xdg-config", "xdg-cache"] {
            std::fs::create_dir_all(root.path().join(dir)).expect("create dir");
        }
        Self { root }
    }

    /// Temporary home directory.
    pub fn home(&self) -> PathBuf {
        self.root.path().join("home")
    }

    /// Temporary dotfiles checkout.
    pub fn dotfiles(&self) -> PathBuf {
        self.root.path().join("dotfiles")
    }

    /// Log directory the binary writes to.
    pub fn cache_dir(&self) -> PathBuf {
        self.root.path().join("xdg-cache").join("dotfiles")
    }

    /// The binary with a scrubbed environment pointing at this machine.
    ///
    /// `PATH` is empty so no external tool is ever found or run.
    pub fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_dotfiles"));
        cmd.args(args)
            .env_clear()
            .env("HOME", self.home())
            .env("USER", "tester")
            .env("DOTFILES_DOTFILES_DIR", self.dotfiles())
            .env("XDG_CONFIG_HOME", self.root.path().join("xdg-config"))
            .env("XDG_CACHE_HOME", self.root.path().join("xdg-cache"))
            .env("PATH", "")
            .stdin(Stdio::null());
        cmd
    }

    /// Run the binary and collect its output.
    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().expect("spawn dotfiles")
    }
}

/// Every entry under `dir`, relative and sorted.
pub fn tree(dir: &Path) -> Vec<String> {
    let mut out = Vec::new();
    walk(dir, dir, &mut out);
    out.sort();
    out
}

fn walk(base: &Path, dir: &Path, out: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        out.push(
            path.strip_prefix(base)
                .expect("under base")
                .display()
                .to_string(),
        );
        if path.is_dir() && !path.is_symlink() {
            walk(base, &path, out);
        }
    }
}

/// [`Log`] that keeps messages for assertions.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<(String, String)>>,
}

impl MemoryLog {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, kind: &str, msg: &str) {
        self.lines
            .lock()
            .expect("lock")
            .push((kind.to_string(), msg.to_string()));
    }

    /// Messages logged with the method named `kind`.
    pub fn messages(&self, kind: &str) -> Vec<String> {
        self.lines
            .lock()
            .expect("lock")
            .iter()
            .filter(|(k, _)| k == kind)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Log for MemoryLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn success(&self, msg: &str) {
        self.push("success", msg);
    }
    fn skip(&self, msg: &str) {
        self.push("skip", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
    fn dry_run(&self, msg: &str) {
        self.push("dry_run", msg);
    }
    fn record_task(&self, name: &str, _status: TaskStatus, _message: Option<&str>) {
        self.push("task", name);
    }
}
