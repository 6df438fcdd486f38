//! Level-routed JSON-lines logging for the monitor.
//!
//! Info/warn/error entries share the error log; performance and sanity
//! entries get their own files. Each file rotates independently by size.
//! Log I/O failures are reported through `tracing` and swallowed — a broken
//! disk must never take the monitor down.

use crate::rotating_log::{RotatingLog, RotatingLogConfig};
use serde_json::json;
use std::fs;
use std::io;
use std::path::Path;
use tracing::error;
use vigil_core::config::LogConfig;
use vigil_core::model::{LogEntry, LogLevel};

pub struct MonitorLogger {
    error_log: RotatingLog,
    performance_log: RotatingLog,
    sanity_log: RotatingLog,
    echo: bool,
}

impl MonitorLogger {
    /// Open the three log files under `config.dir`.
    pub fn new(config: &LogConfig, echo: bool) -> io::Result<Self> {
        let open = |name: &str| {
            RotatingLog::open(RotatingLogConfig {
                file_path: config.dir.join(name),
                max_file_size_bytes: config.max_file_size_bytes,
                max_rotated_files: config.max_rotated_files,
            })
        };
        Ok(Self {
            error_log: open("errors.log")?,
            performance_log: open("performance.log")?,
            sanity_log: open("sanity.log")?,
            echo,
        })
    }

    /// Append an entry to the file for its level.
    pub fn log(&self, level: LogLevel, message: &str, data: serde_json::Value) {
        let entry = LogEntry::new(level, message, data);

        if self.echo {
            println!(
                "[{}] {}: {} {}",
                entry.timestamp.to_rfc3339(),
                entry.level.as_str().to_uppercase(),
                entry.message,
                entry.data,
            );
        }

        let line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "Failed to serialize log entry");
                return;
            }
        };

        let log = match level {
            LogLevel::Performance => &self.performance_log,
            LogLevel::Sanity => &self.sanity_log,
            LogLevel::Info | LogLevel::Warn | LogLevel::Error => &self.error_log,
        };
        if let Err(e) = log.append(&line) {
            error!(error = %e, level = level.as_str(), "Failed to write log entry");
        }
    }

    /// Error entry with a nested error message and free-form context.
    pub fn log_error(&self, message: &str, error_detail: &str, context: serde_json::Value) {
        self.log(
            LogLevel::Error,
            message,
            json!({
                "error": { "message": error_detail },
                "context": context,
            }),
        );
    }

    /// Performance entry: a named metric with its value.
    pub fn log_performance(&self, metric: &str, value: u64, context: serde_json::Value) {
        self.log(
            LogLevel::Performance,
            metric,
            json!({ "value": value, "context": context }),
        );
    }

    /// Sanity (upstream content service) entry.
    pub fn log_sanity(&self, message: &str, data: serde_json::Value) {
        self.log(LogLevel::Sanity, message, data);
    }

    /// Path of the live error log (for the CLI `logs` command).
    pub fn error_log_path(&self) -> &Path {
        self.error_log.path()
    }
}

/// Read the last `n` non-empty lines of a log file. Missing file ⇒ empty vec.
pub fn read_recent_lines(path: &Path, n: usize) -> io::Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    let lines: Vec<String> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(String::from)
        .collect();
    let skip = lines.len().saturating_sub(n);
    Ok(lines.into_iter().skip(skip).collect())
}
