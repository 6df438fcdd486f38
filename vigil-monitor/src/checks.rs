//! The three probes: application liveness, upstream content service, and
//! end-to-end response latency.
//!
//! Every failure path records an error event and a log entry; nothing in
//! here propagates an error to the caller — a probe simply reports whether it
//! succeeded.

use crate::context::MonitorContext;
use crate::tracker;
use chrono::Utc;
use serde_json::json;
use std::time::Instant;
use vigil_core::model::{PerformanceSample, UpstreamHealth, UpstreamStatus};

/// GET the application root. Healthy iff the status code is exactly 200.
pub async fn check_application_health(ctx: &MonitorContext) -> bool {
    let url = ctx.config.app_url();
    match ctx.client.get(&url).timeout(ctx.request_timeout()).send().await {
        Ok(resp) => {
            let status = resp.status().as_u16();
            if status == 200 {
                return true;
            }
            ctx.logger.log_error(
                "Application health check failed",
                &format!("HTTP {status}"),
                json!({ "statusCode": status, "url": url }),
            );
            tracker::track_error(ctx, "health_check_failed", status.to_string()).await;
            false
        }
        Err(e) => {
            ctx.logger.log_error(
                "Application health check error",
                &e.to_string(),
                json!({ "url": url }),
            );
            tracker::track_error(ctx, "health_check_error", e.to_string()).await;
            false
        }
    }
}

/// GET the upstream query endpoint and overwrite the upstream health record.
///
/// A missing project id is a configuration-absence short-circuit: the record
/// becomes `not_configured` and no network call is made.
pub async fn check_upstream_health(ctx: &MonitorContext) -> bool {
    let Some(url) = ctx.config.sanity_query_url() else {
        ctx.logger.log_sanity("Sanity project ID not configured", json!({}));
        ctx.state
            .set_upstream(UpstreamHealth::now(UpstreamStatus::NotConfigured));
        return false;
    };

    match ctx.client.get(&url).timeout(ctx.request_timeout()).send().await {
        Ok(resp) => {
            let status = resp.status().as_u16();
            let healthy = status == 200;
            ctx.state.set_upstream(UpstreamHealth {
                status: if healthy {
                    UpstreamStatus::Healthy
                } else {
                    UpstreamStatus::Unhealthy
                },
                last_check: Some(Utc::now()),
                status_code: Some(status),
                error: None,
            });
            if !healthy {
                ctx.logger.log_sanity(
                    "Sanity health check failed",
                    json!({
                        "statusCode": status,
                        "projectId": ctx.config.sanity.project_id,
                    }),
                );
                tracker::track_error(ctx, "sanity_health_failed", status.to_string()).await;
            }
            healthy
        }
        Err(e) => {
            ctx.state.set_upstream(UpstreamHealth {
                status: UpstreamStatus::Error,
                last_check: Some(Utc::now()),
                status_code: None,
                error: Some(e.to_string()),
            });
            ctx.logger
                .log_sanity("Sanity health check error", json!({ "error": e.to_string() }));
            tracker::track_error(ctx, "sanity_health_error", e.to_string()).await;
            false
        }
    }
}

/// Time a GET of the application root end-to-end (request issued to full body
/// received) and append the sample to the ring buffer.
pub async fn sample_performance(ctx: &MonitorContext) -> Option<PerformanceSample> {
    let url = ctx.config.app_url();
    let start = Instant::now();

    let body = match ctx.client.get(&url).timeout(ctx.request_timeout()).send().await {
        Ok(resp) => {
            let status = resp.status().as_u16();
            match resp.bytes().await {
                Ok(body) => Some((status, body)),
                Err(e) => {
                    performance_check_failed(ctx, &e.to_string()).await;
                    None
                }
            }
        }
        Err(e) => {
            performance_check_failed(ctx, &e.to_string()).await;
            None
        }
    };
    let (status_code, body) = body?;

    let response_time_ms = start.elapsed().as_millis() as u64;
    let sample = PerformanceSample {
        timestamp: Utc::now(),
        response_time_ms,
        status_code,
        content_length: body.len() as u64,
    };
    ctx.state.push_sample(sample.clone());

    ctx.logger.log_performance(
        "response_time",
        response_time_ms,
        json!({
            "statusCode": status_code,
            "contentLength": sample.content_length,
        }),
    );

    if response_time_ms > ctx.config.thresholds.slow_response_ms {
        ctx.logger.log_error(
            "Slow response detected",
            &format!("Response time: {response_time_ms}ms"),
            json!(sample),
        );
        tracker::track_error(ctx, "slow_response", response_time_ms.to_string()).await;
    }

    Some(sample)
}

async fn performance_check_failed(ctx: &MonitorContext, detail: &str) {
    ctx.logger
        .log_error("Performance check error", detail, json!({}));
    tracker::track_error(ctx, "performance_check_error", detail).await;
}
