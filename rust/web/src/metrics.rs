use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Server-wide counters, cheap to clone and shared by every handler.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    total_requests: AtomicU64,
    failed_requests: AtomicU64,
    total_response_time_ms: AtomicU64,
    sessions_created: AtomicU64,
    active_sessions: AtomicU64,
    actions_applied: AtomicU64,
    actions_rejected: AtomicU64,
    hands_dealt: AtomicU64,
    events_delivered: AtomicU64,
    connections_opened: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self, duration_ms: u64, success: bool) {
        self.inner.total_requests.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.inner.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
        self.inner
            .total_response_time_ms
            .fetch_add(duration_ms, Ordering::Relaxed);

        tracing::trace!(duration_ms, success, "recorded request");
    }

    pub fn session_created(&self) {
        self.inner.sessions_created.fetch_add(1, Ordering::Relaxed);
        let count = self.inner.active_sessions.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(active_sessions = count, "session count increased");
    }

    pub fn session_removed(&self) {
        let mut current = self.inner.active_sessions.load(Ordering::Relaxed);
        loop {
            if current == 0 {
                tracing::warn!("attempted to decrement active_sessions below zero");
                return;
            }

            match self.inner.active_sessions.compare_exchange(
                current,
                current - 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    tracing::debug!(active_sessions = current - 1, "session count decreased");
                    return;
                }
                Err(actual) => current = actual,
            }
        }
    }

    pub fn action_applied(&self) {
        self.inner.actions_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn action_rejected(&self) {
        self.inner.actions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hands_dealt(&self, count: u64) {
        self.inner.hands_dealt.fetch_add(count, Ordering::Relaxed);
    }

    pub fn events_delivered(&self, count: u64) {
        self.inner
            .events_delivered
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn connection_opened(&self) {
        self.inner.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        MetricsSnapshot {
            total_requests: load(&self.inner.total_requests),
            failed_requests: load(&self.inner.failed_requests),
            total_response_time_ms: load(&self.inner.total_response_time_ms),
            sessions_created: load(&self.inner.sessions_created),
            active_sessions: load(&self.inner.active_sessions),
            actions_applied: load(&self.inner.actions_applied),
            actions_rejected: load(&self.inner.actions_rejected),
            hands_dealt: load(&self.inner.hands_dealt),
            events_delivered: load(&self.inner.events_delivered),
            connections_opened: load(&self.inner.connections_opened),
        }
    }

    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        tracing::info!(
            total_requests = snapshot.total_requests,
            avg_response_time_ms = snapshot.average_response_time_ms(),
            active_sessions = snapshot.active_sessions,
            actions_applied = snapshot.actions_applied,
            actions_rejected = snapshot.actions_rejected,
            hands_dealt = snapshot.hands_dealt,
            events_delivered = snapshot.events_delivered,
            "server metrics"
        );
    }
}

/// Point-in-time copy of every counter, served by `GET /metrics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub total_response_time_ms: u64,
    pub sessions_created: u64,
    pub active_sessions: u64,
    pub actions_applied: u64,
    pub actions_rejected: u64,
    pub hands_dealt: u64,
    pub events_delivered: u64,
    pub connections_opened: u64,
}

impl MetricsSnapshot {
    pub fn average_response_time_ms(&self) -> u64 {
        if self.total_requests > 0 {
            self.total_response_time_ms / self.total_requests
        } else {
            0
        }
    }
}

/// Times one HTTP request from construction to `finish`.
pub struct RequestTimer {
    start: Instant,
    metrics: MetricsCollector,
}

impl RequestTimer {
    pub fn new(metrics: MetricsCollector) -> Self {
        Self {
            start: Instant::now(),
            metrics,
        }
    }

    pub fn finish(self, success: bool) -> u64 {
        let duration = u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.metrics.record_request(duration, success);
        duration
    }
}
