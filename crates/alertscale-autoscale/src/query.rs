//! Replica read/write seam.
//!
//! The autoscaler never talks to an orchestrator directly; it goes through
//! a [`ServiceQuery`]. `StateStore` is the bundled implementation.

use std::sync::Arc;

use alertscale_state::{StateError, StateStore, function_key};

use crate::error::QueryError;

/// Replica bounds and count of one function as seen by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServiceQueryResponse {
    pub replicas: u64,
    pub max_replicas: u64,
    pub min_replicas: u64,
    pub scaling_factor: u64,
    pub available_replicas: u64,
}

/// Reads and writes replica counts for `(service, namespace)` pairs.
///
/// Implementations must be safe to call from concurrent dispatches; the
/// autoscaler serializes calls per function but not across functions.
pub trait ServiceQuery: Send + Sync {
    fn get_replicas(&self, service: &str, namespace: &str)
    -> Result<ServiceQueryResponse, QueryError>;

    fn set_replicas(&self, service: &str, namespace: &str, count: u64) -> Result<(), QueryError>;
}

impl<T: ServiceQuery + ?Sized> ServiceQuery for Arc<T> {
    fn get_replicas(
        &self,
        service: &str,
        namespace: &str,
    ) -> Result<ServiceQueryResponse, QueryError> {
        (**self).get_replicas(service, namespace)
    }

    fn set_replicas(&self, service: &str, namespace: &str, count: u64) -> Result<(), QueryError> {
        (**self).set_replicas(service, namespace, count)
    }
}

impl ServiceQuery for StateStore {
    fn get_replicas(
        &self,
        service: &str,
        namespace: &str,
    ) -> Result<ServiceQueryResponse, QueryError> {
        let key = function_key(service, namespace);
        let record = self
            .get_function(&key)?
            .ok_or(QueryError::NotFound(key))?;
        Ok(ServiceQueryResponse {
            replicas: record.replicas,
            max_replicas: record.max_replicas,
            min_replicas: record.min_replicas,
            scaling_factor: record.scaling_factor,
            available_replicas: record.available_replicas,
        })
    }

    fn set_replicas(&self, service: &str, namespace: &str, count: u64) -> Result<(), QueryError> {
        let key = function_key(service, namespace);
        match StateStore::set_replicas(self, &key, count) {
            Ok(()) => Ok(()),
            Err(StateError::NotFound(key)) => Err(QueryError::NotFound(key)),
            Err(e) => Err(e.into()),
        }
    }
}
