//! Diagnostic logging for one invocation.
//!
//! [`LogContext`] installs a `tracing` subscriber for as long as it lives.
//! Console output goes to stderr so stdout only carries the rendered device
//! state. At trace level every event is also appended to a timestamped
//! `m8debug-*.log` file, closed when the context is dropped.

use crate::args::DebugLevel;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing::warn;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_SEPARATOR: &str = "\n=================================\n";

impl DebugLevel {
    /// Filter directive for console output.
    fn console_directive(self) -> &'static str {
        match self {
            DebugLevel::Fatal => "error",
            DebugLevel::Warn => "warn",
            // Trace detail goes to the file; the console stays at info.
            DebugLevel::Info | DebugLevel::Trace => "info",
        }
    }
}

/// Name of the trace log file for a given local time.
pub fn log_file_name(now: chrono::DateTime<chrono::Local>) -> String {
    format!("m8debug-{}.log", now.format("%Y%m%d-%H%M%S"))
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(LOG_SEPARATOR.as_bytes())?;
    Ok(file)
}

/// Scoped logging setup; dropping it uninstalls the subscriber and closes
/// the log file.
pub struct LogContext {
    _guard: DefaultGuard,
    log_file: Option<PathBuf>,
}

impl LogContext {
    /// Install logging for `level`. `RUST_LOG`, when set, overrides the
    /// console filter.
    pub fn install(level: DebugLevel) -> Self {
        let console_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.console_directive()));

        let mut open_error = None;
        let mut log_file = None;
        let file_layer = if level == DebugLevel::Trace {
            let path = PathBuf::from(log_file_name(chrono::Local::now()));
            match open_log_file(&path) {
                Ok(file) => {
                    log_file = Some(path);
                    Some(
                        fmt::layer()
                            .with_writer(Mutex::new(file))
                            .with_ansi(false)
                            .with_filter(LevelFilter::TRACE),
                    )
                }
                Err(e) => {
                    open_error = Some((path, e));
                    None
                }
            }
        } else {
            None
        };

        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_filter(console_filter),
            )
            .with(file_layer);
        let guard = tracing::subscriber::set_default(subscriber);

        if let Some((path, e)) = open_error {
            warn!("Failed to open debug log file {}: {e}", path.display());
        }

        Self {
            _guard: guard,
            log_file,
        }
    }

    /// Path of the trace log file, when one is being written.
    pub fn log_file(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }
}
