use thiserror::Error;

/// Errors raised by the persistence layer.
///
/// `Transient` corresponds to the `store-transient` taxonomy entry (the
/// busy-timeout expired without the lock clearing); everything else is
/// surfaced to the caller unwrapped, per spec §7 "Propagation".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store busy/locked: {0}")]
    Transient(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("encoding error: {0}")]
    Encoding(#[from] cgw_types::EncodingError),
}

impl From<StoreError> for cgw_pool::PoolError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Transient(msg) => cgw_pool::PoolError::StoreUnavailable(msg),
            other => cgw_pool::PoolError::StoreUnavailable(other.to_string()),
        }
    }
}
