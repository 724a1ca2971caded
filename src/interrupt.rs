//! Ctrl-C handling shared by the runner and the orchestrator.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context as _, Result};

/// A cloneable flag raised when the user presses Ctrl-C.
///
/// The terminal delivers SIGINT to the whole foreground process group, so a
/// running child dies on its own; the flag lets the runner tell that death
/// apart from an ordinary failure, and lets the orchestrator stop before the
/// next task.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    /// Register the process-wide Ctrl-C handler and return its flag.
    ///
    /// # Errors
    ///
    /// Returns an error if a handler is already installed.
    pub fn install() -> Result<Self> {
        let flag = Self::default();
        let handle = flag.clone();
        ctrlc::set_handler(move || handle.trigger())
            .context("failed to install Ctrl-C handler")?;
        Ok(flag)
    }

    /// Whether an interrupt has been received.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Raise the flag.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let a = Interrupt::default();
        let b = a.clone();
        assert!(!b.is_set());
        a.trigger();
        assert!(b.is_set());
    }
}
