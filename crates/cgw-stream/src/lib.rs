//! The streaming transaction-data assembler (spec §4.5), its read-through
//! chunk cache, and the circuit breakers wrapping the data-index reads
//! (spec §4.8). Transport and the concrete chain/chunk sources live
//! upstream of this crate.

mod breaker;
mod chain_source;
mod chunk_cache;
mod chunk_source;
mod error;
mod stream;

pub use breaker::{BreakerState, BreakerTimeout, CircuitBreaker, CircuitBreakerConfig};
pub use chain_source::ChainSource;
pub use chunk_cache::ReadThroughChunkCache;
pub use chunk_source::ChunkSource;
pub use error::StreamError;
pub use stream::{get_tx_data, TxData};
