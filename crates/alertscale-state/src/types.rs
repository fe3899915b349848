//! Domain types for the alertscale state store.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{StateError, StateResult};

/// Upper bound of `FunctionReplicas::scaling_factor` (a percentage).
pub const MAX_SCALING_FACTOR: u64 = 100;

/// Replica bounds and current replica count of a scalable function.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionReplicas {
    pub name: String,
    pub namespace: String,
    /// Desired replica count most recently written.
    pub replicas: u64,
    pub min_replicas: u64,
    pub max_replicas: u64,
    /// Percentage of `max_replicas` added per scale-up step.
    pub scaling_factor: u64,
    /// Replicas reported ready by the orchestrator.
    #[serde(default)]
    pub available_replicas: u64,
    /// Unix timestamp (seconds) of the last write.
    #[serde(default)]
    pub updated_at: u64,
}

impl FunctionReplicas {
    /// Build the composite key for the functions table.
    pub fn table_key(&self) -> String {
        function_key(&self.name, &self.namespace)
    }

    /// Display name in `name.namespace` form, as alert labels carry it.
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.name, self.namespace)
        }
    }

    /// Reject records that cannot be registered.
    pub fn validate(&self) -> StateResult<()> {
        if self.name.is_empty() {
            return Err(StateError::Invalid("function name is empty".to_string()));
        }
        // `/` separates the table key and `.` separates `name.namespace`
        // in alert labels, which splits on the last dot.
        if self.name.contains('/') {
            return Err(StateError::Invalid(format!(
                "function name {:?} contains '/'",
                self.name
            )));
        }
        if let Some(c) = self.namespace.chars().find(|c| matches!(c, '/' | '.')) {
            return Err(StateError::Invalid(format!(
                "namespace {:?} contains {c:?}",
                self.namespace
            )));
        }
        if self.scaling_factor > MAX_SCALING_FACTOR {
            return Err(StateError::Invalid(format!(
                "scaling factor {} exceeds {MAX_SCALING_FACTOR}",
                self.scaling_factor
            )));
        }
        if self.min_replicas > self.max_replicas {
            return Err(StateError::Invalid(format!(
                "min replicas {} exceeds max replicas {}",
                self.min_replicas, self.max_replicas
            )));
        }
        Ok(())
    }
}

/// Composite key for a function: `{namespace}/{name}`.
pub fn function_key(name: &str, namespace: &str) -> String {
    format!("{namespace}/{name}")
}

pub(crate) fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
