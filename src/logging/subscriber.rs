//! Tracing subscriber setup: console formatter, file layer, and initialisation.
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::utils::{format_local_time, strip_ansi, thread_label};
use crate::error::LoggingError;

/// Timestamp layout of every log file line.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC%z";

/// Environment variable that overrides the console filter.
pub const LOG_FILTER_ENV: &str = "TWEAKS_LOG";

/// Collects the `message` field and any structured fields of an event.
#[derive(Debug, Default)]
struct MessageExtractor {
    message: String,
    fields: String,
}

impl MessageExtractor {
    /// Message followed by ` key=value` pairs.
    fn line(&self) -> String {
        format!("{}{}", self.message, self.fields)
    }
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }
}

/// A [`tracing_subscriber::Layer`] that appends every event to the log file.
///
/// Lines follow `[<timestamp>] [<level>] [<target>] [<thread>] <message>`,
/// with [`LOG_TIMESTAMP_FORMAT`] timestamps and ANSI codes stripped.
#[derive(Debug)]
pub struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Truncate (or create) the log file at `path`, write a run header
    /// naming `component`, and return a layer appending to it.
    ///
    /// # Errors
    ///
    /// Returns [`LoggingError::Io`] if the file cannot be written or opened.
    pub fn new(path: &Path, component: &str) -> Result<Self, LoggingError> {
        let io_err = |source| LoggingError::Io {
            path: path.to_path_buf(),
            source,
        };
        let header = format!(
            "==========================================\n\
             Engine Tweaks {} [{}] {component} {}\n\
             ==========================================\n",
            crate::BUILD_COMMIT,
            crate::BUILD_BRANCH,
            format_local_time(LOG_TIMESTAMP_FORMAT),
        );
        fs::write(path, header).map_err(io_err)?;
        let file = fs::OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(io_err)?;
        Ok(Self {
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

        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);

        let line = format!(
            "[{}] [{}] [{}] [{}] {}",
            format_local_time(LOG_TIMESTAMP_FORMAT),
            metadata.level().as_str().to_lowercase(),
            metadata.target(),
            thread_label(),
            strip_ansi(&extractor.line()),
        );

        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "{line}").ok();
        }
    }
}

/// A [`tracing_subscriber::fmt::FormatEvent`] for console output.
#[derive(Debug)]
struct ConsoleFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
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
        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let msg = extractor.line();

        match *event.metadata().level() {
            tracing::Level::ERROR => writeln!(writer, "\x1b[31mERROR\x1b[0m {msg}"),
            tracing::Level::WARN => writeln!(writer, "\x1b[33mWARN\x1b[0m  {msg}"),
            tracing::Level::INFO => writeln!(writer, "  {msg}"),
            _ => writeln!(writer, "  \x1b[2m{msg}\x1b[0m"),
        }
    }
}

/// Console layer: warnings and errors on stderr, everything else on stdout.
///
/// Shows `info` and above, `debug` when `verbose`; `TWEAKS_LOG` overrides both.
fn console_layer<S>(verbose: bool) -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + 'static,
{
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{EnvFilter, Layer as _, filter::LevelFilter, fmt};

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let console_filter = EnvFilter::builder()
        .with_default_directive(console_level.into())
        .with_env_var(LOG_FILTER_ENV)
        .from_env_lossy();

    let make_writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(std::io::stdout.with_min_level(tracing::Level::INFO));

    fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(make_writer)
        .with_filter(console_filter)
}

/// Whether events emitted on this thread already reach a subscriber.
fn subscriber_active() -> bool {
    tracing::dispatcher::get_default(|current| !current.is::<tracing::subscriber::NoSubscriber>())
}

/// Construct the process-wide logger.
///
/// Installs a global subscriber with the console layer and a [`FileLayer`]
/// writing everything at `debug` and above to `path`. Must be called once,
/// before any logging.
///
/// # Errors
///
/// Returns [`LoggingError::AlreadyInstalled`] without touching `path` if
/// the calling thread already has a subscriber, or if installing the global
/// one fails. Returns [`LoggingError::Io`] if the log file cannot be created.
pub fn init_subscriber(
    path: &Path,
    component: &str,
    verbose: bool,
) -> Result<PathBuf, LoggingError> {
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _,
    };

    if subscriber_active() {
        return Err(LoggingError::AlreadyInstalled);
    }

    let file_layer = FileLayer::new(path, component)?.with_filter(LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(console_layer(verbose))
        .with(file_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)?;

    Ok(path.to_path_buf())
}

/// Install a console-only global subscriber, for commands that do not own
/// a log file.
///
/// # Errors
///
/// Returns [`LoggingError::AlreadyInstalled`] if a global subscriber exists.
pub fn init_console(verbose: bool) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

    tracing_subscriber::registry()
        .with(console_layer(verbose))
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)
}
