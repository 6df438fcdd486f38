//! Integration tests for the monitoring loop: probes against a mock HTTP
//! server, error tracking and alert delivery, scheduler state machine, and
//! report generation.

use mockito::Matcher;
use std::path::Path;
use std::sync::Arc;
use vigil_core::config::MonitorConfig;
use vigil_core::model::{LogEntry, UpstreamStatus};
use vigil_monitor::{Monitor, MonitorContext, checks, report, tracker};
use vigil_observability::logger::read_recent_lines;

// ── Helpers ───────────────────────────────────────────────────

/// Config with long intervals (timers never fire during a test) and logs in
/// a temp dir. `host_with_port` is mockito's `127.0.0.1:PORT`.
fn test_config(log_root: &Path, host_with_port: &str) -> MonitorConfig {
    let (host, port) = host_with_port
        .split_once(':')
        .expect("host:port");
    let mut cfg = MonitorConfig::default();
    cfg.app.host = host.to_string();
    cfg.app.port = port.parse().expect("port");
    cfg.log.dir = log_root.join("logs");
    cfg.intervals.health_secs = 3600;
    cfg.intervals.sanity_secs = 3600;
    cfg.intervals.performance_secs = 3600;
    cfg.intervals.report_secs = 3600;
    cfg
}

fn make_ctx(cfg: MonitorConfig) -> MonitorContext {
    MonitorContext::new(cfg).expect("context")
}

fn error_log_entries(ctx: &MonitorContext) -> Vec<LogEntry> {
    read_recent_lines(&ctx.config.log.dir.join("errors.log"), usize::MAX)
        .expect("read error log")
        .iter()
        .map(|l| serde_json::from_str(l).expect("parse log line"))
        .collect()
}

fn window_kinds(ctx: &MonitorContext) -> Vec<String> {
    ctx.state
        .window_snapshot(ctx.error_window())
        .into_iter()
        .map(|e| e.kind)
        .collect()
}

// ── Application health ────────────────────────────────────────

#[tokio::test]
async fn health_check_succeeds_on_exact_200() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("GET", "/").with_status(200).create_async().await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = make_ctx(test_config(dir.path(), &server.host_with_port()));

    assert!(checks::check_application_health(&ctx).await);
    assert!(window_kinds(&ctx).is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn health_check_records_failure_on_non_200() {
    let mut server = mockito::Server::new_async().await;
    server.mock("GET", "/").with_status(503).create_async().await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = make_ctx(test_config(dir.path(), &server.host_with_port()));

    assert!(!checks::check_application_health(&ctx).await);
    assert_eq!(window_kinds(&ctx), vec!["health_check_failed"]);

    let entries = error_log_entries(&ctx);
    assert!(
        entries
            .iter()
            .any(|e| e.message == "Application health check failed"
                && e.data["error"]["message"] == "HTTP 503"),
        "expected failure detail in error log: {entries:?}"
    );
}

#[tokio::test]
async fn health_check_records_transport_error() {
    // Bind-then-drop to get a port with nothing listening.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let dir = tempfile::tempdir().unwrap();
    let ctx = make_ctx(test_config(dir.path(), &format!("127.0.0.1:{port}")));

    assert!(!checks::check_application_health(&ctx).await);
    assert_eq!(window_kinds(&ctx), vec!["health_check_error"]);
}

// ── Upstream (content service) health ─────────────────────────

#[tokio::test]
async fn upstream_without_project_id_short_circuits_to_not_configured() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = make_ctx(test_config(dir.path(), "127.0.0.1:1"));

    assert!(!checks::check_upstream_health(&ctx).await);

    let health = ctx.state.upstream();
    assert_eq!(health.status, UpstreamStatus::NotConfigured);
    assert!(health.last_check.is_some());
    assert!(window_kinds(&ctx).is_empty(), "configuration absence is not a failure");
}

#[tokio::test]
async fn upstream_200_overwrites_record_as_healthy() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/probe")
        .with_status(200)
        .with_body(r#"{"result":{}}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(dir.path(), &server.host_with_port());
    cfg.sanity.query_url = Some(format!("{}/probe", server.url()));
    let ctx = make_ctx(cfg);

    assert!(checks::check_upstream_health(&ctx).await);
    let health = ctx.state.upstream();
    assert_eq!(health.status, UpstreamStatus::Healthy);
    assert_eq!(health.status_code, Some(200));
    mock.assert_async().await;
}

#[tokio::test]
async fn upstream_non_200_is_unhealthy_and_tracked() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/probe")
        .with_status(503)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(dir.path(), &server.host_with_port());
    cfg.sanity.query_url = Some(format!("{}/probe", server.url()));
    let ctx = make_ctx(cfg);

    assert!(!checks::check_upstream_health(&ctx).await);
    let health = ctx.state.upstream();
    assert_eq!(health.status, UpstreamStatus::Unhealthy);
    assert_eq!(health.status_code, Some(503));
    assert_eq!(window_kinds(&ctx), vec!["sanity_health_failed"]);
}

#[tokio::test]
async fn upstream_transport_error_sets_error_status() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(dir.path(), "127.0.0.1:1");
    cfg.sanity.query_url = Some(format!("http://127.0.0.1:{port}/probe"));
    let ctx = make_ctx(cfg);

    assert!(!checks::check_upstream_health(&ctx).await);
    let health = ctx.state.upstream();
    assert_eq!(health.status, UpstreamStatus::Error);
    assert!(health.error.is_some());
    assert_eq!(window_kinds(&ctx), vec!["sanity_health_error"]);
}

// ── Performance sampling ──────────────────────────────────────

#[tokio::test]
async fn performance_sample_measures_and_buffers() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/")
        .with_status(200)
        .with_body("hello")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = make_ctx(test_config(dir.path(), &server.host_with_port()));

    let sample = checks::sample_performance(&ctx).await.expect("sample");
    assert_eq!(sample.status_code, 200);
    assert_eq!(sample.content_length, 5);
    assert_eq!(ctx.state.sample_count(), 1);

    let perf_lines = read_recent_lines(&ctx.config.log.dir.join("performance.log"), 10).unwrap();
    assert_eq!(perf_lines.len(), 1);
    let entry: LogEntry = serde_json::from_str(&perf_lines[0]).unwrap();
    assert_eq!(entry.message, "response_time");
}

#[tokio::test]
async fn performance_sample_failure_returns_none_and_tracks() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let dir = tempfile::tempdir().unwrap();
    let ctx = make_ctx(test_config(dir.path(), &format!("127.0.0.1:{port}")));

    assert!(checks::sample_performance(&ctx).await.is_none());
    assert_eq!(ctx.state.sample_count(), 0);
    assert_eq!(window_kinds(&ctx), vec!["performance_check_error"]);
}

// ── Error tracking & alerting ─────────────────────────────────

#[tokio::test]
async fn alert_fires_once_when_window_crosses_threshold() {
    let mut server = mockito::Server::new_async().await;
    let hook = server
        .mock("POST", "/hook")
        .match_body(Matcher::Regex(r#""type":"x""#.to_string()))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(dir.path(), &server.host_with_port());
    cfg.alert.webhook_url = Some(format!("{}/hook", server.url()));
    let ctx = make_ctx(cfg);

    for _ in 0..5 {
        tracker::track_error(&ctx, "x", "a").await;
    }

    hook.assert_async().await;

    let entries = error_log_entries(&ctx);
    assert!(
        entries.iter().any(|e| e.message == "Alert sent successfully"),
        "delivery success must be logged"
    );
}

#[tokio::test]
async fn alert_payload_carries_window_errors() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = make_ctx(test_config(dir.path(), "127.0.0.1:1"));

    for _ in 0..5 {
        tracker::track_error(&ctx, "x", "a").await;
    }

    let payload = tracker::build_alert_payload(&ctx, ctx.state.window_len(ctx.error_window()));
    assert_eq!(payload.errors.len(), 5);
    assert!(payload.errors.iter().all(|e| e.kind == "x" && e.details == "a"));
    assert!(payload.message.contains("5 errors"));
}

#[tokio::test]
async fn no_webhook_url_means_no_delivery_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = make_ctx(test_config(dir.path(), "127.0.0.1:1"));
    assert!(ctx.config.alert.webhook_url.is_none());

    // Well past the threshold — alerting stays a no-op.
    for i in 0..8 {
        tracker::track_error(&ctx, "x", i.to_string()).await;
    }
    assert_eq!(ctx.state.window_len(ctx.error_window()), 8);

    let entries = error_log_entries(&ctx);
    assert!(entries.iter().all(|e| e.message != "Alert sent successfully"));
    assert!(entries.iter().all(|e| e.message != "Error sending alert"));
}

#[tokio::test]
async fn failed_delivery_is_logged_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let hook = server
        .mock("POST", "/hook")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(dir.path(), &server.host_with_port());
    cfg.alert.webhook_url = Some(format!("{}/hook", server.url()));
    let ctx = make_ctx(cfg);

    for _ in 0..5 {
        tracker::track_error(&ctx, "x", "a").await;
    }

    hook.assert_async().await;
    let entries = error_log_entries(&ctx);
    assert!(
        entries
            .iter()
            .any(|e| e.message == "Failed to send alert" && e.data["error"]["message"] == "HTTP 500")
    );
}

// ── Scheduler state machine ───────────────────────────────────

#[tokio::test]
async fn start_twice_runs_initial_round_once() {
    let mut server = mockito::Server::new_async().await;
    // Health check + performance sample — one round only.
    let root = server
        .mock("GET", "/")
        .with_status(200)
        .expect(2)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = Arc::new(make_ctx(test_config(dir.path(), &server.host_with_port())));
    let mut monitor = Monitor::new(Arc::clone(&ctx));

    monitor.start().await;
    assert!(monitor.is_running());
    monitor.start().await; // warning no-op
    assert!(monitor.is_running());

    root.assert_async().await;

    let entries = error_log_entries(&ctx);
    assert!(entries.iter().any(|e| e.message == "Error monitor already running"));

    monitor.stop();
    assert!(!monitor.is_running());
}

#[tokio::test]
async fn stop_without_start_is_a_warning_noop() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = Arc::new(make_ctx(test_config(dir.path(), "127.0.0.1:1")));
    let mut monitor = Monitor::new(Arc::clone(&ctx));

    monitor.stop();
    monitor.stop();
    assert!(!monitor.is_running());

    let entries = error_log_entries(&ctx);
    assert_eq!(
        entries
            .iter()
            .filter(|e| e.message == "Error monitor not running")
            .count(),
        2
    );
}

// ── Report generation ─────────────────────────────────────────

#[tokio::test]
async fn report_with_no_data_has_null_analyses() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = make_ctx(test_config(dir.path(), "127.0.0.1:1"));

    let generated = report::generate_report(&ctx);
    assert!(generated.performance.is_none());
    assert!(generated.errors.is_none());
    assert_eq!(generated.sanity.status, UpstreamStatus::Unknown);

    let reports: Vec<_> = std::fs::read_dir(&ctx.config.log.dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            name.starts_with("report-") && name.ends_with(".json")
        })
        .collect();
    assert_eq!(reports.len(), 1, "one report file per generation");

    let body = std::fs::read_to_string(reports[0].path()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(parsed["performance"].is_null());
    assert!(parsed["errors"].is_null());
    assert_eq!(parsed["config"]["port"], 1);
}

#[tokio::test]
async fn report_aggregates_live_data() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/")
        .with_status(200)
        .with_body("ok")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = make_ctx(test_config(dir.path(), &server.host_with_port()));

    checks::sample_performance(&ctx).await;
    tracker::track_error(&ctx, "health_check_failed", "503").await;

    let generated = report::generate_report(&ctx);
    let perf = generated.performance.expect("performance analysis");
    assert_eq!(perf.total_requests, 1);
    let errors = generated.errors.expect("error analysis");
    assert_eq!(errors.total_errors, 1);
    assert_eq!(errors.most_common_error, "health_check_failed");
}
