// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Vigil — site health & error monitor
//
//  Probes:    application root + upstream Sanity content API
//  Tracking:  5-minute sliding error window, webhook alerting
//  Output:    rotating JSON-lines logs + periodic JSON reports
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use vigil_core::MonitorConfig;
use vigil_core::model::LogEntry;
use vigil_monitor::{Monitor, MonitorContext, report};
use vigil_observability::logger::read_recent_lines;

/// Error-log lines shown by `vigil logs`.
const RECENT_LOG_COUNT: usize = 20;

#[derive(Parser, Debug)]
#[command(name = "vigil", version, about = "Vigil — site health & error monitor")]
struct Cli {
    /// Command: start | stop | status | logs | report | help
    #[arg(default_value = "start")]
    command: String,

    /// Path to configuration file
    #[arg(short, long, default_value = "vigil.yaml")]
    config: PathBuf,

    /// Log level for process diagnostics
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Tracing ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .init();

    // ── Config ──
    let config = MonitorConfig::load(&cli.config)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(async {
        match cli.command.as_str() {
            "start" => cmd_start(config).await,
            "stop" => cmd_stop(config),
            "status" => cmd_status(config),
            "logs" => cmd_logs(&config),
            "report" => cmd_report(config),
            "help" => {
                print_help();
                Ok(())
            }
            other => {
                println!("Unknown command: {other}");
                print_help();
                std::process::exit(1);
            }
        }
    })
}

// ── Commands ─────────────────────────────────────────────────────────────────

/// Run the monitor until SIGINT/SIGTERM.
async fn cmd_start(config: MonitorConfig) -> anyhow::Result<()> {
    let ctx = Arc::new(MonitorContext::new(config)?);
    let mut monitor = Monitor::new(Arc::clone(&ctx));

    info!(
        version = env!("CARGO_PKG_VERSION"),
        app = %ctx.config.app_url(),
        "Vigil starting"
    );

    monitor.start().await;
    wait_for_shutdown().await?;

    println!("\nShutting down error monitor...");
    monitor.stop();
    Ok(())
}

fn cmd_stop(config: MonitorConfig) -> anyhow::Result<()> {
    // One-shot invocation: the fresh monitor is not running, and stop()
    // records the warning, matching a stop issued to an idle instance.
    let ctx = Arc::new(MonitorContext::new(config)?);
    Monitor::new(ctx).stop();
    Ok(())
}

fn cmd_status(config: MonitorConfig) -> anyhow::Result<()> {
    let ctx = Arc::new(MonitorContext::new(config)?);
    let monitor = Monitor::new(Arc::clone(&ctx));

    let upstream = ctx.state.upstream();
    let memory = report::memory_stats();
    let window_minutes = ctx.config.alert.window_secs / 60;

    println!("\nError Monitor Status:");
    println!("  Running: {}", monitor.is_running());
    println!(
        "  Errors ({window_minutes}min): {}",
        ctx.state.window_len(ctx.error_window())
    );
    println!("  Performance Metrics: {}", ctx.state.sample_count());
    println!("  Sanity Status: {}", upstream.status.as_str());
    println!(
        "  Last Sanity Check: {}",
        upstream
            .last_check
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".into())
    );
    println!("  Uptime: {}s", ctx.state.uptime().as_secs());
    println!("  Memory: {}MB", memory.rss_bytes / 1024 / 1024);
    Ok(())
}

/// Print the most recent error-log entries as `[timestamp] LEVEL: message`.
fn cmd_logs(config: &MonitorConfig) -> anyhow::Result<()> {
    let path = config.log.dir.join("errors.log");
    let lines = read_recent_lines(&path, RECENT_LOG_COUNT)?;

    if lines.is_empty() {
        println!("No error logs found");
        return Ok(());
    }

    println!("\nRecent Error Logs:");
    for line in lines {
        match serde_json::from_str::<LogEntry>(&line) {
            Ok(entry) => {
                println!(
                    "[{}] {}: {}",
                    entry.timestamp.to_rfc3339(),
                    entry.level.as_str().to_uppercase(),
                    entry.message
                );
                if let Some(nested) = entry.data.get("error").and_then(|e| e.get("message")) {
                    if let Some(msg) = nested.as_str() {
                        println!("  Error: {msg}");
                    }
                }
            }
            Err(_) => println!("{line}"),
        }
    }
    Ok(())
}

fn cmd_report(config: MonitorConfig) -> anyhow::Result<()> {
    let ctx = MonitorContext::new(config)?;
    report::generate_report(&ctx);
    println!("Report generated in logs directory");
    Ok(())
}

fn print_help() {
    println!(
        r#"
Vigil Error Monitor

Usage:
  vigil [command]

Commands:
  start     Start error monitoring (default)
  stop      Stop error monitoring
  status    Show current status
  logs      Show recent error logs
  report    Generate current report
  help      Show this help

Environment Variables (override vigil.yaml):
  VIGIL_APP__HOST            Application host (default: localhost)
  VIGIL_APP__PORT            Application port (default: 3001)
  VIGIL_SANITY__PROJECT_ID   Sanity project ID (absent: upstream check disabled)
  VIGIL_ALERT__WEBHOOK_URL   Webhook URL for alerts (absent: alerting disabled)
  VIGIL_ENVIRONMENT          development | production (development echoes logs)

Examples:
  vigil start
  VIGIL_ALERT__WEBHOOK_URL=https://hooks.slack.com/... vigil start
"#
    );
}

// ── Shutdown ─────────────────────────────────────────────────────────────────

/// Resolve on SIGINT or SIGTERM.
#[cfg(unix)]
async fn wait_for_shutdown() -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown() -> anyhow::Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
