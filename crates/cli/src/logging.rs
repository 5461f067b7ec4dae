use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";
const LOG_FILE: &str = "packetline.log";

/// Log filter and format, already merged from flags/env and config file
#[derive(Debug, Default, Clone)]
pub struct LogSettings {
    pub filter: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Json,
    Pretty,
}

impl LogSettings {
    /// Anything but `pretty` logs JSON lines
    fn log_format(&self) -> LogFormat {
        match self.format.as_deref() {
            Some(f) if f.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }

    /// Explicit filter, then `RUST_LOG`, then the default. Bad directives fall through.
    fn env_filter(&self) -> (EnvFilter, String) {
        if let Some(directive) = self.filter.as_deref() {
            if let Ok(filter) = EnvFilter::try_new(directive) {
                return (filter, directive.to_string());
            }
        }
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            let directive = std::env::var("RUST_LOG").unwrap_or_default();
            return (filter, directive);
        }
        (EnvFilter::new(DEFAULT_FILTER), DEFAULT_FILTER.to_string())
    }
}

pub struct LoggingHandle {
    pub run_id: String,
    /// Flushes the log writer on drop
    pub _guard: WorkerGuard,
}

pub fn init_logging(log_dir: &Path, settings: &LogSettings) -> anyhow::Result<LoggingHandle> {
    std::fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(LOG_FILE);

    let (filter, directive) = settings.env_filter();
    let format = settings.log_format();
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, LOG_FILE));

    // Exactly one of the two layers is Some
    let (json_layer, pretty_layer) = match format {
        LogFormat::Json => (
            Some(
                fmt::layer()
                    .with_writer(writer)
                    .json()
                    .flatten_event(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_current_span(true),
            ),
            None,
        ),
        LogFormat::Pretty => (
            None,
            Some(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .pretty()
                    .with_file(true)
                    .with_line_number(true),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()?;

    let started = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let run_id = format!("pid-{}-{}", std::process::id(), started);

    tracing::info!(
        component = "logging",
        event = "logging.initialized",
        log_path = %log_path.display(),
        format = ?format,
        filter = %directive,
    );

    Ok(LoggingHandle {
        run_id,
        _guard: guard,
    })
}
