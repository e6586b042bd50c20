//! Tracing setup: console output plus an optional per-run JSON log file.

use std::path::Path;

use docportal_config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `--verbose`. A log file that cannot be created is
/// reported on stderr and skipped. Keep the returned guard alive until exit
/// so buffered file events are flushed.
pub fn init(verbose: bool, config: &LoggingConfig) -> Option<WorkerGuard> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = if config.file {
        match file_appender(Path::new(&config.dir)) {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                (
                    Some(fmt::layer().json().with_ansi(false).with_writer(writer)),
                    Some(guard),
                )
            }
            Err(e) => {
                eprintln!("  [warn] log file disabled: {e}");
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    guard
}

/// `MM_DD_YYYY_HH_MM_SS`, the stem of this run's log file.
pub fn log_file_stem() -> String {
    chrono::Local::now().format("%m_%d_%Y_%H_%M_%S").to_string()
}

/// A never-rotating appender writing `<dir>/<stem>.log`; creates `dir`.
fn file_appender(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(log_file_stem())
        .filename_suffix("log")
        .build(dir)
}
