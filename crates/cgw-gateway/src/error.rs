use thiserror::Error;

/// Errors surfaced across the capability-set boundary (spec §6/§7): every
/// error a pool job, store call, query, or stream assembly can raise,
/// aggregated so callers handle one type.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("pool error: {0}")]
    Pool(#[from] cgw_pool::PoolError),

    #[error(transparent)]
    Store(#[from] cgw_store::StoreError),

    #[error(transparent)]
    Query(#[from] cgw_query::QueryError),

    #[error(transparent)]
    Stream(#[from] cgw_stream::StreamError),

    #[error(transparent)]
    Encoding(#[from] cgw_types::EncodingError),
}

impl From<cgw_stream::BreakerTimeout> for GatewayError {
    /// Lets `CircuitBreaker::call` wrap a `GatewayError`-returning closure
    /// directly, without a detour through `StreamError`.
    fn from(timeout: cgw_stream::BreakerTimeout) -> Self {
        GatewayError::Stream(cgw_stream::StreamError::from(timeout))
    }
}

impl From<GatewayError> for cgw_pool::PoolError {
    /// Lets a pool job closure (which must return `Result<T, PoolError>`)
    /// propagate any of this crate's errors by `?`.
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Pool(e) => e,
            other => cgw_pool::PoolError::StoreUnavailable(other.to_string()),
        }
    }
}
