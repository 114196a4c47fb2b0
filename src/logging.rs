//! Log setup: console output plus a daily rolling file in the log directory.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log files are named `autoverify.log.YYYY-MM-DD`.
pub const LOG_FILE_PREFIX: &str = "autoverify.log";

/// Default filter directive for the given verbosity.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "autoverify=debug"
    } else {
        "autoverify=info"
    }
}

/// Console-only logging, for commands that don't touch the log directory.
pub fn init_console(verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Console and rolling file logging.
///
/// `RUST_LOG` overrides the default filter. Keep the returned guard alive
/// for as long as the program logs; dropping it flushes the file writer.
pub fn init_with_file(log_dir: &Path, verbose: bool) -> Result<WorkerGuard, InitError> {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(log_dir)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer().with_writer(writer).with_ansi(false);
    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let _ = tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(console_layer)
        .with(file_layer)
        .try_init();

    Ok(guard)
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)))
}
