//! Logging setup for processes embedding the bridge.
//!
//! A browser-hosted extension has no useful stderr, so records go to a
//! daily-rolled file under the user's data directory. `init` returns the
//! appender's worker guard; the embedder holds it for the process lifetime
//! so buffered records flush on exit.

use std::env;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const DEBUG_ENV: &str = "HARBOR_SHELL_DEBUG_LOG";
const LOG_FILE_PREFIX: &str = "shell-bridge.log";

fn log_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".harbordrive").join("logs"))
}

fn env_filter() -> EnvFilter {
    let debug_enabled = env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Installs the global subscriber. Returns `None` when no log directory is
/// available, in which case records go to stderr instead.
pub fn init() -> Option<WorkerGuard> {
    if let Some(dir) = log_dir() {
        if std::fs::create_dir_all(&dir).is_ok() {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(writer)
                .with_ansi(false)
                .init();
            return Some(guard);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .init();
    None
}
