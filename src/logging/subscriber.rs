//! Tracing subscriber: a console formatter and a per-command log file.
use std::fs;
use std::io::Write as _;
use std::sync::Mutex;

use tracing::Level;

use super::utils::{DATETIME_FORMAT, TIME_FORMAT, log_file_path, strip_ansi, utc_now};

/// Target used for stage headers.
pub(super) const STAGE: &str = "dotfiles::stage";
/// Target used for dry-run previews.
pub(super) const DRY_RUN: &str = "dotfiles::dry_run";
/// Target used for completed actions.
pub(super) const SUCCESS: &str = "dotfiles::success";
/// Target used for actions that were not needed.
pub(super) const SKIP: &str = "dotfiles::skip";

/// Collects the `message` field of an event.
#[derive(Default)]
struct Message(String);

impl tracing::field::Visit for Message {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.0 = value.to_string();
        }
    }
}

fn message_of(event: &tracing::Event<'_>) -> String {
    let mut message = Message::default();
    event.record(&mut message);
    message.0
}

/// Plain-text marker for an event in the log file.
fn file_marker(level: Level, target: &str) -> &'static str {
    match (level, target) {
        (Level::INFO, STAGE) => "==> ",
        (Level::INFO, DRY_RUN) => "    [dry run] ",
        (Level::INFO, SUCCESS) => "    [ok] ",
        (Level::INFO, SKIP) => "    [skip] ",
        (Level::ERROR, _) => "    [error] ",
        (Level::WARN, _) => "    [warn] ",
        (Level::DEBUG | Level::TRACE, _) => "    [debug] ",
        _ => "    ",
    }
}

/// Layer appending every event, timestamped and without colour, to
/// `<cache>/dotfiles/<command>.log`. The file is truncated at startup.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Truncate the log file for `command` and write its header line.
    ///
    /// `None` when the file cannot be created.
    pub(super) fn new(command: &str) -> Option<Self> {
        let path = log_file_path(command)?;
        let header = format!(
            "# dotfiles {} {command} started {} UTC\n",
            crate::VERSION,
            utc_now(DATETIME_FORMAT),
        );
        fs::write(&path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(&path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();
        let marker = file_marker(*metadata.level(), metadata.target());
        let line = format!(
            "[{}] {marker}{}",
            utc_now(TIME_FORMAT),
            strip_ansi(&message_of(event))
        );
        if let Ok(mut file) = self.file.lock() {
            writeln!(file, "{line}").ok();
        }
    }
}

/// Console output: bold stage headers, coloured status glyphs, indented
/// detail lines.
struct ConsoleFormat;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormat
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let msg = message_of(event);
        match (*metadata.level(), metadata.target()) {
            (Level::ERROR, _) => writeln!(writer, "\x1b[31m✗ ERROR\x1b[0m {msg}"),
            (Level::WARN, _) => writeln!(writer, "\x1b[33m⚠ WARN\x1b[0m  {msg}"),
            (Level::INFO, STAGE) => writeln!(writer, "\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
            (Level::INFO, DRY_RUN) => writeln!(writer, "  \x1b[2m[DRY RUN]\x1b[0m {msg}"),
            (Level::INFO, SUCCESS) => writeln!(writer, "  \x1b[32m✓\x1b[0m {msg}"),
            (Level::INFO, SKIP) => writeln!(writer, "  \x1b[33m○\x1b[0m {msg}"),
            (Level::INFO, _) => writeln!(writer, "  {msg}"),
            _ => writeln!(writer, "  \x1b[2m{msg}\x1b[0m"),
        }
    }
}

/// Install the global subscriber for one command run.
///
/// Warnings and errors go to stderr, everything else to stdout; debug
/// lines reach the console only with `verbose`. The log file always
/// receives debug output. Call once, before anything logs.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .and(std::io::stdout.with_min_level(Level::INFO));

    let console = fmt::layer()
        .event_format(ConsoleFormat)
        .with_writer(writer)
        .with_filter(console_level);
    let file = FileLayer::new(command).map(|layer| layer.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_markers_by_target() {
        assert_eq!(file_marker(Level::INFO, STAGE), "==> ");
        assert_eq!(file_marker(Level::INFO, SKIP), "    [skip] ");
        assert_eq!(file_marker(Level::INFO, "dotfiles_cli::tasks"), "    ");
        assert_eq!(file_marker(Level::WARN, STAGE), "    [warn] ");
        assert_eq!(file_marker(Level::DEBUG, "any"), "    [debug] ");
    }
}
