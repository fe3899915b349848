//! alertscale-core — shared types for the alert-driven autoscaler.
//!
//! Holds the Alertmanager webhook payload, the closed set of alert names
//! the replica policy reacts to, workload namespace resolution, and the
//! `alertscale.toml` configuration.

pub mod alert;
pub mod config;
pub mod namespace;

pub use alert::*;
pub use config::{AlertscaleConfig, ConfigError};
pub use namespace::get_namespace;
