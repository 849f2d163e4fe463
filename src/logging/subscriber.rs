//! Tracing subscriber setup: console formatter, file layer, and initialisation.
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::sync::Mutex;

use super::{LOG_ENV, LOG_FILE_ENV};

/// `strftime` pattern for the run header written when the file opens.
const HEADER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `strftime` pattern prefixed to every event line.
const EVENT_TIME_FORMAT: &str = "%H:%M:%S%.3f";

fn utc_now(pattern: &str) -> String {
    chrono::Utc::now().format(pattern).to_string()
}

/// Extracts the `message` field from a [`tracing::Event`].
#[derive(Default)]
struct MessageExtractor {
    message: String,
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

/// A [`tracing_subscriber::Layer`] appending events to the file named by
/// `INIEDIT_LOG_FILE`, one timestamped line each, tagged with the event's
/// target module so lock and commit traces can be told apart.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Open `path` for appending and record which run the following lines
    /// belong to. Returns `None` if the file cannot be opened or written.
    pub(super) fn new(path: &Path) -> Option<Self> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()?;
        writeln!(
            file,
            "iniedit {} pid {} started {} UTC",
            crate::cli::VERSION,
            std::process::id(),
            utc_now(HEADER_TIME_FORMAT),
        )
        .ok()?;
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
        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);

        let line = format!(
            "{} {:<5} {}: {}",
            utc_now(EVENT_TIME_FORMAT),
            metadata.level(),
            metadata.target(),
            extractor.message,
        );
        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "{line}").ok();
        }
    }
}

/// A [`tracing_subscriber::fmt::FormatEvent`] that prefixes each console
/// line with the program name, the way command-line tools report on stderr.
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
        let msg = &extractor.message;

        match *event.metadata().level() {
            tracing::Level::ERROR => writeln!(writer, "iniedit: error: {msg}"),
            tracing::Level::WARN => writeln!(writer, "iniedit: warning: {msg}"),
            tracing::Level::INFO => writeln!(writer, "iniedit: {msg}"),
            _ => writeln!(writer, "iniedit: debug: {msg}"),
        }
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// Console events go to stderr, filtered at `warn` (or `info` with
/// `verbose`) unless `INIEDIT_LOG` holds an [`EnvFilter`] directive. When
/// `INIEDIT_LOG_FILE` names a path, every `debug` event is also appended
/// there. Must be called once at program startup, before any logging.
///
/// [`EnvFilter`]: tracing_subscriber::EnvFilter
pub fn init_subscriber(verbose: bool) {
    use tracing_subscriber::{
        EnvFilter, Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "info" } else { "warn" })
    });

    let console_layer = fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let file_layer = std::env::var_os(LOG_FILE_ENV)
        .filter(|path| !path.is_empty())
        .and_then(|path| FileLayer::new(Path::new(&path)))
        .map(|l| l.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}
