//! Scaling outcome counters.
//!
//! Lock-free atomics for the outcome counters and a mutex-protected map
//! for the per-alert-name receive counts. One `ScaleMetrics` is created at
//! startup and shared by `Arc`; there is no process-global registry.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaleCounters {
    /// Alerts received, keyed by alert name (`other` for unknown rules).
    pub alerts_received: BTreeMap<String, u64>,
    pub scale_ups: u64,
    pub scale_downs: u64,
    pub unchanged: u64,
    /// Alerts whose function name resolved to nothing.
    pub ignored: u64,
    pub read_failures: u64,
    pub write_failures: u64,
}

impl ScaleCounters {
    pub fn alerts_total(&self) -> u64 {
        self.alerts_received.values().sum()
    }
}

/// Shared counters updated by the alert dispatcher.
#[derive(Debug, Default)]
pub struct ScaleMetrics {
    alerts_received: Mutex<BTreeMap<String, u64>>,
    scale_ups: AtomicU64,
    scale_downs: AtomicU64,
    unchanged: AtomicU64,
    ignored: AtomicU64,
    read_failures: AtomicU64,
    write_failures: AtomicU64,
}

impl ScaleMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a received alert. `alert_name` becomes a map key, so callers
    /// pass a bounded label (see `AlertName::metric_label`).
    pub fn record_alert(&self, alert_name: &str) {
        let mut received = self
            .alerts_received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *received.entry(alert_name.to_string()).or_insert(0) += 1;
        trace!(%alert_name, "alert recorded");
    }

    /// Record an applied replica change.
    pub fn record_scaled(&self, from: u64, to: u64) {
        if to > from {
            self.scale_ups.fetch_add(1, Ordering::Relaxed);
        } else {
            self.scale_downs.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_unchanged(&self) {
        self.unchanged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_read_failure(&self) {
        self.read_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ScaleCounters {
        let alerts_received = self
            .alerts_received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        ScaleCounters {
            alerts_received,
            scale_ups: self.scale_ups.load(Ordering::Relaxed),
            scale_downs: self.scale_downs.load(Ordering::Relaxed),
            unchanged: self.unchanged.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn fresh_metrics_are_zero() {
        let metrics = ScaleMetrics::new();
        assert_eq!(metrics.snapshot(), ScaleCounters::default());
    }

    #[test]
    fn alerts_counted_per_name() {
        let metrics = ScaleMetrics::new();
        metrics.record_alert("APIHighInvocationRate");
        metrics.record_alert("APIHighInvocationRate");
        metrics.record_alert("InstanceDown");

        let snap = metrics.snapshot();
        assert_eq!(snap.alerts_received["APIHighInvocationRate"], 2);
        assert_eq!(snap.alerts_received["InstanceDown"], 1);
        assert_eq!(snap.alerts_total(), 3);
    }

    #[test]
    fn scaled_direction_is_tracked() {
        let metrics = ScaleMetrics::new();
        metrics.record_scaled(1, 5);
        metrics.record_scaled(8, 4);
        metrics.record_scaled(4, 1);

        let snap = metrics.snapshot();
        assert_eq!(snap.scale_ups, 1);
        assert_eq!(snap.scale_downs, 2);
    }

    #[test]
    fn concurrent_recording() {
        let metrics = Arc::new(ScaleMetrics::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let m = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        m.record_alert("InstanceDown");
                        m.record_write_failure();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snap = metrics.snapshot();
        assert_eq!(snap.alerts_received["InstanceDown"], 400);
        assert_eq!(snap.write_failures, 400);
    }
}
