//! Usage: Tracing setup: env-filtered stdout plus daily-rolling file logs.

use crate::app_paths;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

const LOG_FILTER_ENV: &str = "INTEGRATO_LOG";
const DEFAULT_LOG_FILTER: &str = "info";
const LOG_FILE_PREFIX: &str = "integrato.log";

// The non-blocking writer flushes only while its guard lives; park it for the
// process lifetime.
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

pub(crate) fn init<R: tauri::Runtime>(app: &tauri::AppHandle<R>) {
    // Route `log`-crate records from dependencies into tracing. The fmt
    // builder below does not install the bridge itself, so this is the only
    // initialization attempt.
    let _ = tracing_log::LogTracer::init();

    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match app_paths::logs_dir(app) {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (file_writer, guard) = tracing_appender::non_blocking(appender);
            let _ = LOG_GUARD.set(guard);

            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(file_writer.and(std::io::stdout))
                .finish();
            if tracing::subscriber::set_global_default(subscriber).is_err() {
                // A subscriber already exists (tests, repeated setup); keep it.
                return;
            }
            tracing::info!(version = env!("CARGO_PKG_VERSION"), "logging initialized");
        }
        Err(err) => {
            let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
            let _ = tracing::subscriber::set_global_default(subscriber);
            tracing::warn!("file logging disabled, falling back to stdout: {err}");
        }
    }
}
