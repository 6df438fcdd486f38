//! Error tracking and webhook alerting.
//!
//! `track_error` is the single entry point for every detected failure. It
//! appends to the sliding window, evicts stale entries, and fires a
//! best-effort webhook alert once the window reaches the configured
//! threshold. Alert delivery is never retried and never fatal.

use crate::context::MonitorContext;
use chrono::Utc;
use serde_json::json;
use std::time::Duration;
use vigil_core::model::{AlertPayload, ErrorEvent};

/// Errors included in the alert payload.
const ALERT_ERROR_COUNT: usize = 10;
/// Performance samples included in the alert payload.
const ALERT_SAMPLE_COUNT: usize = 5;

/// Record a failure: append to the window, evict entries older than the
/// window length, and alert if the post-eviction size reaches the threshold.
pub async fn track_error(ctx: &MonitorContext, kind: &str, details: impl Into<String>) {
    let details = details.into();
    let event = ErrorEvent::new(kind, details.clone());
    let window_len = ctx.state.push_error(event, ctx.error_window());

    if window_len >= ctx.config.alert.threshold {
        send_alert(ctx, window_len).await;
    }

    ctx.logger.log_error(
        &format!("Error tracked: {kind}"),
        &details,
        json!({ "errorCount": window_len }),
    );
}

/// POST the alert payload to the configured webhook. No webhook URL makes
/// this a no-op — no network call is made regardless of window size.
async fn send_alert(ctx: &MonitorContext, window_len: usize) {
    let Some(webhook_url) = ctx.config.alert.webhook_url.as_deref() else {
        return;
    };

    let payload = build_alert_payload(ctx, window_len);
    let timeout = Duration::from_secs(ctx.config.alert.webhook_timeout_secs);

    match ctx
        .client
        .post(webhook_url)
        .timeout(timeout)
        .json(&payload)
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => {
            ctx.logger
                .log(vigil_core::model::LogLevel::Info, "Alert sent successfully", json!({}));
        }
        Ok(resp) => {
            ctx.logger.log_error(
                "Failed to send alert",
                &format!("HTTP {}", resp.status().as_u16()),
                json!({}),
            );
        }
        Err(e) => {
            ctx.logger.log_error("Error sending alert", &e.to_string(), json!({}));
        }
    }
}

/// Compose the webhook body: window size summary, the last 10 errors, the
/// last 5 performance samples, and the current upstream health.
pub fn build_alert_payload(ctx: &MonitorContext, window_len: usize) -> AlertPayload {
    let window_minutes = ctx.config.alert.window_secs / 60;
    AlertPayload {
        timestamp: Utc::now(),
        message: format!(
            "High error rate detected: {window_len} errors in the last {window_minutes} minutes"
        ),
        errors: ctx.state.recent_errors(ALERT_ERROR_COUNT, ctx.error_window()),
        performance: ctx.state.recent_samples(ALERT_SAMPLE_COUNT),
        sanity: ctx.state.upstream(),
    }
}
