use crate::breaker::BreakerTimeout;
use thiserror::Error;

/// Errors surfaced by the streaming assembler and its chunk/chain sources.
///
/// There is no `circuit-open` variant here: per spec §7/§9 a tripped
/// breaker is observable to its caller as `Ok(None)`, not as an error.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("chain source lookup failed: {0}")]
    ChainSource(String),

    #[error("chunk fetch failed at relative offset {relative_offset}: {message}")]
    ChunkFetch { relative_offset: u64, message: String },

    #[error("data source call timed out")]
    Timeout,
}

impl From<BreakerTimeout> for StreamError {
    fn from(_: BreakerTimeout) -> Self {
        StreamError::Timeout
    }
}
