//! Point-in-time aggregates over the performance buffer and error window.
//!
//! Both analyzers return `None` on empty input rather than a zero-filled
//! struct, so a report distinguishes "no data" from "all quiet".

use chrono::Timelike;
use std::collections::BTreeMap;
use vigil_core::model::{ErrorAnalysis, ErrorEvent, PerformanceAnalysis, PerformanceSample, TimeRange};

/// Aggregate the given samples (callers pass the last 20): mean/min/max
/// latency, slow-request count, and the fraction of status codes >= 400.
pub fn analyze_performance(
    recent: &[PerformanceSample],
    slow_threshold_ms: u64,
) -> Option<PerformanceAnalysis> {
    if recent.is_empty() {
        return None;
    }

    let times: Vec<u64> = recent.iter().map(|s| s.response_time_ms).collect();
    let total: u64 = times.iter().sum();
    let error_count = recent.iter().filter(|s| s.status_code >= 400).count();

    Some(PerformanceAnalysis {
        average_response_time: total as f64 / recent.len() as f64,
        min_response_time: *times.iter().min().unwrap_or(&0),
        max_response_time: *times.iter().max().unwrap_or(&0),
        slow_requests: recent
            .iter()
            .filter(|s| s.response_time_ms > slow_threshold_ms)
            .count(),
        error_rate: error_count as f64 / recent.len() as f64,
        total_requests: recent.len(),
    })
}

/// Aggregate the error window: frequency by type and by UTC hour-of-day, the
/// most frequent type (ties broken toward the lexically smallest type), and
/// the window's time span.
pub fn analyze_errors(window: &[ErrorEvent]) -> Option<ErrorAnalysis> {
    let first = window.first()?;
    let last = window.last()?;

    let mut error_types: BTreeMap<String, usize> = BTreeMap::new();
    let mut error_frequency: BTreeMap<u32, usize> = BTreeMap::new();
    for event in window {
        *error_types.entry(event.kind.clone()).or_insert(0) += 1;
        *error_frequency.entry(event.timestamp.hour()).or_insert(0) += 1;
    }

    // BTreeMap iterates in key order, so keeping the first maximum yields the
    // lexically smallest type on a count tie.
    let most_common_error = error_types
        .iter()
        .fold(("", 0usize), |best, (kind, &count)| {
            if count > best.1 { (kind.as_str(), count) } else { best }
        })
        .0
        .to_string();

    Some(ErrorAnalysis {
        total_errors: window.len(),
        error_types,
        error_frequency,
        most_common_error,
        time_range: TimeRange {
            start: first.timestamp,
            end: last.timestamp,
        },
    })
}
