//! Log file location, timestamps, and console helpers.
use std::path::PathBuf;

/// Timestamp prefix of every log file line.
pub(super) const TIME_FORMAT: &str = "%H:%M:%S";

/// Timestamp in the log file header.
pub(super) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time rendered with a `chrono` format string.
pub(super) fn utc_now(format: &str) -> String {
    chrono::Utc::now().format(format).to_string()
}

/// `<cache>/dotfiles/<command>.log`, where `<cache>` is `$XDG_CACHE_HOME`
/// or `~/.cache`. The directory is created on first use.
///
/// `None` when neither variable is set or the directory cannot be created;
/// the run then logs to the console only.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    let cache = std::env::var_os("XDG_CACHE_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))?;
    let dir = cache.join("dotfiles");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir.join(format!("{command}.log")))
}

/// Drop ANSI escape sequences (CSI and two-byte escapes).
pub(super) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_escape = false;
    for c in s.chars() {
        match (in_escape, c) {
            (false, '\x1b') => in_escape = true,
            (false, c) => out.push(c),
            // CSI introducer; parameters follow until a final byte.
            (true, '[') => {}
            (true, c) if ('@'..='~').contains(&c) => in_escape = false,
            (true, _) => {}
        }
    }
    out
}

/// Width of the attached terminal, 80 when there is none.
pub(super) fn console_width() -> usize {
    terminal_size::terminal_size().map_or(80, |(terminal_size::Width(w), _)| usize::from(w))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn strip_ansi_removes_colors() {
        assert_eq!(strip_ansi("\x1b[31m✗ ERROR\x1b[0m hello"), "✗ ERROR hello");
        assert_eq!(
            strip_ansi("\x1b[1;34m==>\x1b[0m \x1b[1mPhase 1/4: System\x1b[0m"),
            "==> Phase 1/4: System"
        );
        assert_eq!(strip_ansi("plain"), "plain");
        assert_eq!(strip_ansi(""), "");
    }

    #[test]
    fn strip_ansi_handles_other_escapes() {
        assert_eq!(strip_ansi("\x1b[2;5Htext"), "text");
        assert_eq!(strip_ansi("\x1b[Kworld"), "world");
        assert_eq!(strip_ansi("\x1bMtext"), "text");
    }

    #[test]
    fn timestamps_use_fixed_width() {
        let time = utc_now(TIME_FORMAT);
        assert_eq!(time.len(), 8);
        assert_eq!(&time[2..3], ":");

        let datetime = utc_now(DATETIME_FORMAT);
        assert_eq!(datetime.len(), 19);
        assert_eq!(&datetime[4..5], "-");
        assert_eq!(&datetime[10..11], " ");
    }
}
