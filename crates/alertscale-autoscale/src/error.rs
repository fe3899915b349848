//! Autoscaler error types.

use alertscale_state::StateError;
use thiserror::Error;

/// Errors returned by a [`ServiceQuery`](crate::ServiceQuery) backend.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("function not found: {0}")]
    NotFound(String),

    #[error("state store error: {0}")]
    State(#[from] StateError),

    #[error("service query error: {0}")]
    Other(#[from] anyhow::Error),
}

/// A replica write that could not be applied for one alert.
#[derive(Debug, Error)]
#[error("unable to scale function {function} in namespace {namespace} to {replicas} replicas: {source}")]
pub struct ScaleError {
    pub function: String,
    pub namespace: String,
    pub replicas: u64,
    #[source]
    pub source: QueryError,
}
