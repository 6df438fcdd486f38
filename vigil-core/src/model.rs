//! Data model for the monitor: log entries, error events, performance
//! samples, upstream health, and the derived analyses/report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Logging ──────────────────────────────────────────────────────────────────

/// Severity/routing level of a [`LogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Performance,
    Sanity,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Performance => "performance",
            LogLevel::Sanity => "sanity",
        }
    }
}

/// One JSON-lines record. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
    pub pid: u32,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            data,
            pid: std::process::id(),
        }
    }
}

// ── Errors & performance ─────────────────────────────────────────────────────

/// A detected failure. Lives only in the in-memory 5-minute sliding window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub details: String,
}

impl ErrorEvent {
    pub fn new(kind: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind: kind.into(),
            details: details.into(),
        }
    }
}

/// One timed probe of the application root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSample {
    pub timestamp: DateTime<Utc>,
    pub response_time_ms: u64,
    pub status_code: u16,
    pub content_length: u64,
}

// ── Upstream health ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamStatus {
    Unknown,
    Healthy,
    Unhealthy,
    NotConfigured,
    Error,
}

impl UpstreamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamStatus::Unknown => "unknown",
            UpstreamStatus::Healthy => "healthy",
            UpstreamStatus::Unhealthy => "unhealthy",
            UpstreamStatus::NotConfigured => "not_configured",
            UpstreamStatus::Error => "error",
        }
    }
}

/// Last-known upstream state. Overwritten wholesale by every check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamHealth {
    pub status: UpstreamStatus,
    pub last_check: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for UpstreamHealth {
    fn default() -> Self {
        Self {
            status: UpstreamStatus::Unknown,
            last_check: None,
            status_code: None,
            error: None,
        }
    }
}

impl UpstreamHealth {
    pub fn now(status: UpstreamStatus) -> Self {
        Self {
            status,
            last_check: Some(Utc::now()),
            status_code: None,
            error: None,
        }
    }
}

// ── Analyses ─────────────────────────────────────────────────────────────────

/// Aggregate over the most recent performance samples (last 20).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceAnalysis {
    pub average_response_time: f64,
    pub min_response_time: u64,
    pub max_response_time: u64,
    /// Samples above the slow-request threshold (2000 ms).
    pub slow_requests: usize,
    /// Fraction of samples with status code >= 400.
    pub error_rate: f64,
    pub total_requests: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Aggregate over the current error window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorAnalysis {
    pub total_errors: usize,
    /// Count per error type.
    pub error_types: BTreeMap<String, usize>,
    /// Count per UTC hour-of-day.
    pub error_frequency: BTreeMap<u32, usize>,
    /// Ties broken toward the lexically smallest type.
    pub most_common_error: String,
    pub time_range: TimeRange,
}

// ── Report ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStats {
    pub rss_bytes: u64,
    pub virtual_bytes: u64,
}

/// Configuration echo embedded in each report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub host: String,
    pub port: u16,
    pub check_interval_secs: u64,
}

/// Point-in-time consolidated report. Serialized to its own file, write-once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: u64,
    pub memory: MemoryStats,
    pub performance: Option<PerformanceAnalysis>,
    pub errors: Option<ErrorAnalysis>,
    pub sanity: UpstreamHealth,
    pub config: ReportConfig,
}

// ── Alerting ─────────────────────────────────────────────────────────────────

/// Webhook body sent when the error window crosses the alert threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertPayload {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// Last 10 window errors.
    pub errors: Vec<ErrorEvent>,
    /// Last 5 performance samples.
    pub performance: Vec<PerformanceSample>,
    pub sanity: UpstreamHealth,
}
