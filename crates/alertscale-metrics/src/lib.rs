//! alertscale-metrics — observability for the alert-driven autoscaler.
//!
//! Counts what happened to every alert the dispatcher handled and renders
//! those counters, together with the per-function replica gauges read
//! from the state store, in Prometheus text exposition format.
//!
//! # Architecture
//!
//! ```text
//! ScaleMetrics (shared via Arc)
//!   ├── record_*() ← called once per alert outcome
//!   └── snapshot() → ScaleCounters
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for /metrics endpoint
//! ```

pub mod collector;
pub mod prometheus;

pub use collector::{ScaleCounters, ScaleMetrics};
pub use prometheus::render_prometheus;
