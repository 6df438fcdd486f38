//! The monitoring loop: two states (stopped, running), four independent
//! periodic timers, graceful stop.
//!
//! Every probe swallows its own failures (see `checks`), so a failing check
//! can never terminate a timer task; the interval simply fires again.

use crate::checks;
use crate::context::MonitorContext;
use crate::report;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::info;
use vigil_core::model::LogLevel;

pub struct Monitor {
    ctx: Arc<MonitorContext>,
    running: bool,
    tasks: Vec<JoinHandle<()>>,
}

impl Monitor {
    pub fn new(ctx: Arc<MonitorContext>) -> Self {
        Self {
            ctx,
            running: false,
            tasks: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn context(&self) -> &Arc<MonitorContext> {
        &self.ctx
    }

    /// Transition stopped → running: one immediate round of checks, then four
    /// periodic timers. A second `start` is a warning no-op.
    pub async fn start(&mut self) {
        if self.running {
            self.ctx
                .logger
                .log(LogLevel::Warn, "Error monitor already running", json!({}));
            return;
        }
        self.running = true;

        self.ctx.logger.log(
            LogLevel::Info,
            "Starting error monitoring",
            serde_json::to_value(&self.ctx.config).unwrap_or(serde_json::Value::Null),
        );

        // Initial round — reports wait for their first interval.
        checks::check_application_health(&self.ctx).await;
        checks::check_upstream_health(&self.ctx).await;
        checks::sample_performance(&self.ctx).await;

        let intervals = &self.ctx.config.intervals;

        self.tasks.push(spawn_every(
            Arc::clone(&self.ctx),
            Duration::from_secs(intervals.health_secs),
            |ctx| async move {
                checks::check_application_health(&ctx).await;
            },
        ));
        self.tasks.push(spawn_every(
            Arc::clone(&self.ctx),
            Duration::from_secs(intervals.sanity_secs),
            |ctx| async move {
                checks::check_upstream_health(&ctx).await;
            },
        ));
        self.tasks.push(spawn_every(
            Arc::clone(&self.ctx),
            Duration::from_secs(intervals.performance_secs),
            |ctx| async move {
                checks::sample_performance(&ctx).await;
            },
        ));
        self.tasks.push(spawn_every(
            Arc::clone(&self.ctx),
            Duration::from_secs(intervals.report_secs),
            |ctx| async move {
                report::generate_report(&ctx);
            },
        ));

        info!(
            health_secs = intervals.health_secs,
            sanity_secs = intervals.sanity_secs,
            performance_secs = intervals.performance_secs,
            report_secs = intervals.report_secs,
            "Monitor timers installed"
        );
    }

    /// Transition running → stopped, cancelling all timers. A second `stop`
    /// is a warning no-op.
    pub fn stop(&mut self) {
        if !self.running {
            self.ctx
                .logger
                .log(LogLevel::Warn, "Error monitor not running", json!({}));
            return;
        }
        self.running = false;

        for task in self.tasks.drain(..) {
            task.abort();
        }
        info!("Monitor timers cancelled");

        self.ctx
            .logger
            .log(LogLevel::Info, "Error monitoring stopped", json!({}));
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

/// Run `tick` every `period`. The first (immediate) interval tick is consumed
/// so the initial round in `start` is not doubled.
fn spawn_every<F, Fut>(ctx: Arc<MonitorContext>, period: Duration, tick: F) -> JoinHandle<()>
where
    F: Fn(Arc<MonitorContext>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        timer.tick().await;
        loop {
            timer.tick().await;
            tick(Arc::clone(&ctx)).await;
        }
    })
}
