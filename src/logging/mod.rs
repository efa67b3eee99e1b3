use std::io;

use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime, time::LocalTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::cli::types::{LogFormat, LogLevel};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

const LOG_DIR: &str = "./logs";
const DEFAULT_MAX_LOG_FILES: usize = 7;

pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub file_path: Option<String>,
    pub max_log_files: Option<usize>,
}

/// Install the global subscriber. Console output goes to stderr so it never mixes with
/// transformed text on stdout.
///
/// The returned guard flushes the file appender on drop and must live as long as logging
/// is needed.
pub fn configure_global_tracing(
    config: LogConfig,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
    let timer = LocalTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ));

    let level = config.level.as_tracing_level();
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("text_interceptor={}", level).parse()?)
        .add_directive("tokio=warn".parse()?);

    let mut layers: Vec<BoxedLayer> = vec![console_layer(config.format, timer.clone())];
    let mut guard = None;

    if let Some(file_path) = config.file_path {
        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(&file_path)
            .filename_suffix("log")
            .max_log_files(config.max_log_files.unwrap_or(DEFAULT_MAX_LOG_FILES))
            .build(LOG_DIR)?;
        let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

        layers.push(file_layer(config.format, timer, non_blocking_file));
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;

    Ok(guard)
}

fn console_layer<T>(format: LogFormat, timer: T) -> BoxedLayer
where
    T: FormatTime + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_thread_ids(true)
            .with_line_number(false)
            .with_file(true)
            .with_timer(timer)
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_timer(timer)
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_timer(timer)
            .with_writer(io::stderr)
            .boxed(),
    }
}

fn file_layer<T>(
    format: LogFormat,
    timer: T,
    writer: tracing_appender::non_blocking::NonBlocking,
) -> BoxedLayer
where
    T: FormatTime + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_thread_ids(true)
            .with_ansi(false)
            .with_timer(timer)
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_timer(timer)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_ansi(false)
            .with_timer(timer)
            .with_writer(writer)
            .boxed(),
    }
}
