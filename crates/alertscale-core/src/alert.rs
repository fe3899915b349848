//! Alertmanager webhook payload types.
//!
//! These mirror the JSON body Prometheus Alertmanager POSTs to a webhook
//! receiver. Only the fields the replica policy needs are typed strictly
//! (`status`, `labels.alertname`, `labels.function_name`); the rest are
//! carried for logging.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Label value of the high invocation-rate rule.
pub const HIGH_INVOCATION_RATE: &str = "APIHighInvocationRate";

/// Label value of the instance-down rule.
pub const INSTANCE_DOWN: &str = "InstanceDown";

/// Metrics label shared by every alert name outside the known rules.
pub const OTHER_ALERT_LABEL: &str = "other";

/// Top-level webhook body: a group of alerts sharing a receiver.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PrometheusAlert {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub receiver: String,
    #[serde(default)]
    pub alerts: Vec<PrometheusInnerAlert>,
}

/// A single alert within a webhook body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrometheusInnerAlert {
    pub status: AlertStatus,
    #[serde(default)]
    pub labels: PrometheusInnerAlertLabel,
    #[serde(default)]
    pub annotations: PrometheusInnerAlertAnnotations,
    #[serde(default, rename = "startsAt")]
    pub starts_at: String,
    #[serde(default, rename = "endsAt")]
    pub ends_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PrometheusInnerAlertLabel {
    #[serde(default, rename = "alertname")]
    pub alert_name: AlertName,
    #[serde(default)]
    pub function_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PrometheusInnerAlertAnnotations {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub summary: String,
}

/// Lifecycle state of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    /// Condition currently true.
    Firing,
    /// Condition cleared.
    Resolved,
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertStatus::Firing => f.write_str("firing"),
            AlertStatus::Resolved => f.write_str("resolved"),
        }
    }
}

/// The alert rules the replica policy distinguishes.
///
/// Any label other than the two known rules lands in `Other`, keeping the
/// raw value so it can be logged and re-serialized unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlertName {
    HighInvocationRate,
    InstanceDown,
    Other(String),
}

impl AlertName {
    pub fn as_str(&self) -> &str {
        match self {
            AlertName::HighInvocationRate => HIGH_INVOCATION_RATE,
            AlertName::InstanceDown => INSTANCE_DOWN,
            AlertName::Other(raw) => raw,
        }
    }

    /// Bounded label for per-name counters; every unknown rule maps to
    /// [`OTHER_ALERT_LABEL`].
    pub fn metric_label(&self) -> &str {
        match self {
            AlertName::Other(_) => OTHER_ALERT_LABEL,
            known => known.as_str(),
        }
    }
}

impl Default for AlertName {
    /// A missing `alertname` label, which takes the min-replicas fallback.
    fn default() -> Self {
        AlertName::Other(String::new())
    }
}

impl From<&str> for AlertName {
    fn from(raw: &str) -> Self {
        match raw {
            HIGH_INVOCATION_RATE => AlertName::HighInvocationRate,
            INSTANCE_DOWN => AlertName::InstanceDown,
            other => AlertName::Other(other.to_string()),
        }
    }
}

impl From<String> for AlertName {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            HIGH_INVOCATION_RATE => AlertName::HighInvocationRate,
            INSTANCE_DOWN => AlertName::InstanceDown,
            _ => AlertName::Other(raw),
        }
    }
}

impl From<AlertName> for String {
    fn from(name: AlertName) -> Self {
        match name {
            AlertName::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AlertName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PrometheusInnerAlert {
    /// Build a bare alert for the given rule and function.
    pub fn new(alert_name: impl Into<AlertName>, status: AlertStatus, function_name: &str) -> Self {
        Self {
            status,
            labels: PrometheusInnerAlertLabel {
                alert_name: alert_name.into(),
                function_name: function_name.to_string(),
            },
            annotations: PrometheusInnerAlertAnnotations::default(),
            starts_at: String::new(),
            ends_at: String::new(),
        }
    }
}
