//! Consolidated report generation.
//!
//! A report snapshots both analyzers, process stats, and the upstream health
//! record, logs it at info level, and persists the full JSON body to a
//! uniquely-named file in the log directory. Reports are write-once and never
//! rotated.

use crate::analyzer;
use crate::context::MonitorContext;
use chrono::Utc;
use serde_json::json;
use std::fs;
use sysinfo::{ProcessesToUpdate, System};
use vigil_core::model::{LogLevel, MemoryStats, Report, ReportConfig};

/// Samples fed into the performance analysis.
const ANALYSIS_SAMPLE_COUNT: usize = 20;

/// Build, log, and persist a report. File write failure is logged, never
/// propagated.
pub fn generate_report(ctx: &MonitorContext) -> Report {
    let samples = ctx.state.recent_samples(ANALYSIS_SAMPLE_COUNT);
    let window = ctx.state.window_snapshot(ctx.error_window());

    let report = Report {
        timestamp: Utc::now(),
        uptime_secs: ctx.state.uptime().as_secs(),
        memory: memory_stats(),
        performance: analyzer::analyze_performance(&samples, ctx.config.thresholds.analysis_slow_ms),
        errors: analyzer::analyze_errors(&window),
        sanity: ctx.state.upstream(),
        config: ReportConfig {
            host: ctx.config.app.host.clone(),
            port: ctx.config.app.port,
            check_interval_secs: ctx.config.intervals.health_secs,
        },
    };

    ctx.logger.log(
        LogLevel::Info,
        "Monitoring report generated",
        serde_json::to_value(&report).unwrap_or(serde_json::Value::Null),
    );

    let path = ctx
        .config
        .log
        .dir
        .join(format!("report-{}.json", report.timestamp.timestamp_millis()));
    match serde_json::to_string_pretty(&report) {
        Ok(body) => {
            if let Err(e) = fs::write(&path, body) {
                ctx.logger.log_error(
                    "Report write failed",
                    &e.to_string(),
                    json!({ "path": path.display().to_string() }),
                );
            }
        }
        Err(e) => {
            ctx.logger
                .log_error("Report serialization failed", &e.to_string(), json!({}));
        }
    }

    report
}

/// Current process memory usage.
pub fn memory_stats() -> MemoryStats {
    let Ok(pid) = sysinfo::get_current_pid() else {
        return MemoryStats { rss_bytes: 0, virtual_bytes: 0 };
    };
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    match sys.process(pid) {
        Some(process) => MemoryStats {
            rss_bytes: process.memory(),
            virtual_bytes: process.virtual_memory(),
        },
        None => MemoryStats { rss_bytes: 0, virtual_bytes: 0 },
    }
}
