//! Tracing subscriber setup.
//!
//! The full-screen shell owns the terminal, so it logs to a daily rolling file
//! under `${EVENTZEN_HOME}/logs`. Headless commands log to stderr.
//! The filter comes from `EVENTZEN_LOG` (e.g. `EVENTZEN_LOG=eventzen_core=debug`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Env var holding the tracing filter directive.
pub const LOG_ENV_VAR: &str = "EVENTZEN_LOG";

const LOG_FILE_PREFIX: &str = "eventzen.log";

/// Where log records go.
#[derive(Debug, Clone)]
pub enum LogTarget {
    /// Daily rolling file in the given directory.
    File(PathBuf),
    /// Standard error.
    Stderr,
}

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Installs the global tracing subscriber.
///
/// The returned guard must be held for the lifetime of the process so buffered
/// records are flushed on exit.
///
/// # Errors
/// Returns an error if the log directory cannot be created or a subscriber is
/// already installed.
pub fn init(target: LogTarget) -> Result<WorkerGuard> {
    match target {
        LogTarget::File(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter("info"))
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!(e))
                .context("Failed to install log subscriber")?;
            Ok(guard)
        }
        LogTarget::Stderr => {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
            tracing_subscriber::fmt()
                .with_env_filter(env_filter("warn"))
                .with_writer(writer)
                .with_target(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!(e))
                .context("Failed to install log subscriber")?;
            Ok(guard)
        }
    }
}
