//! Replica store errors.

use thiserror::Error;

pub type StateResult<T> = Result<T, StateError>;

/// Failures of the redb-backed replica store.
///
/// redb reports distinct error types per operation; each is flattened to
/// its message so callers only match on which step failed.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("unable to open replica store: {0}")]
    Open(String),

    #[error("replica store transaction failed: {0}")]
    Transaction(String),

    #[error("unable to open functions table: {0}")]
    Table(String),

    #[error("unable to read function record: {0}")]
    Read(String),

    #[error("unable to write function record: {0}")]
    Write(String),

    #[error("unable to encode function record: {0}")]
    Serialize(String),

    #[error("unable to decode function record: {0}")]
    Deserialize(String),

    /// No record under the given `{namespace}/{name}` key.
    #[error("function not found: {0}")]
    NotFound(String),

    /// Record rejected at registration.
    #[error("invalid function record: {0}")]
    Invalid(String),
}
