//! Shared mutable monitor state.
//!
//! Three structures back the whole loop: the sliding error window, the
//! performance ring buffer, and the last-known upstream health record. Each
//! sits behind its own `Mutex`; critical sections are short and never held
//! across an `.await`, which preserves the append/evict/overwrite semantics
//! under OS threads.

use chrono::{Duration as ChronoDuration, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use vigil_core::model::{ErrorEvent, PerformanceSample, UpstreamHealth};

/// Ring buffer capacity: only the most recent samples are retained.
pub const MAX_SAMPLES: usize = 100;

pub struct MonitorState {
    window: Mutex<VecDeque<ErrorEvent>>,
    samples: Mutex<VecDeque<PerformanceSample>>,
    upstream: Mutex<UpstreamHealth>,
    lifetime_errors: AtomicU64,
    started_at: Instant,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorState {
    pub fn new() -> Self {
        Self {
            window: Mutex::new(VecDeque::new()),
            samples: Mutex::new(VecDeque::new()),
            upstream: Mutex::new(UpstreamHealth::default()),
            lifetime_errors: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    // ── Error window ──────────────────────────────────────────────

    /// Append an event, bump the lifetime counter, evict everything older
    /// than `max_age`, and return the post-eviction window size.
    pub fn push_error(&self, event: ErrorEvent, max_age: Duration) -> usize {
        let mut window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        window.push_back(event);
        self.lifetime_errors.fetch_add(1, Ordering::Relaxed);
        Self::evict(&mut window, max_age);
        window.len()
    }

    /// Current window size, after evicting stale entries.
    pub fn window_len(&self, max_age: Duration) -> usize {
        let mut window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        Self::evict(&mut window, max_age);
        window.len()
    }

    /// Snapshot of the window (stale entries evicted first), oldest first.
    pub fn window_snapshot(&self, max_age: Duration) -> Vec<ErrorEvent> {
        let mut window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        Self::evict(&mut window, max_age);
        window.iter().cloned().collect()
    }

    /// The `n` most recent window entries, oldest first.
    pub fn recent_errors(&self, n: usize, max_age: Duration) -> Vec<ErrorEvent> {
        let snapshot = self.window_snapshot(max_age);
        let skip = snapshot.len().saturating_sub(n);
        snapshot.into_iter().skip(skip).collect()
    }

    fn evict(window: &mut VecDeque<ErrorEvent>, max_age: Duration) {
        let cutoff = Utc::now()
            - ChronoDuration::from_std(max_age).unwrap_or_else(|_| ChronoDuration::seconds(300));
        window.retain(|e| e.timestamp > cutoff);
    }

    /// Errors tracked since process start (not windowed).
    pub fn lifetime_errors(&self) -> u64 {
        self.lifetime_errors.load(Ordering::Relaxed)
    }

    // ── Performance ring buffer ───────────────────────────────────

    /// Append a sample, discarding the oldest past [`MAX_SAMPLES`].
    pub fn push_sample(&self, sample: PerformanceSample) {
        let mut samples = self.samples.lock().unwrap_or_else(|e| e.into_inner());
        samples.push_back(sample);
        while samples.len() > MAX_SAMPLES {
            samples.pop_front();
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// The `n` most recent samples, oldest first.
    pub fn recent_samples(&self, n: usize) -> Vec<PerformanceSample> {
        let samples = self.samples.lock().unwrap_or_else(|e| e.into_inner());
        let skip = samples.len().saturating_sub(n);
        samples.iter().skip(skip).cloned().collect()
    }

    // ── Upstream health ───────────────────────────────────────────

    /// Overwrite the single upstream record.
    pub fn set_upstream(&self, health: UpstreamHealth) {
        *self.upstream.lock().unwrap_or_else(|e| e.into_inner()) = health;
    }

    pub fn upstream(&self) -> UpstreamHealth {
        self.upstream.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    // ── Process ───────────────────────────────────────────────────

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
