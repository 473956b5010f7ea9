//! The underlying chunk fetcher (spec §4.5's
//! `ChunkDataByAbsoluteOrRelativeOffsetSource`). Consumed by this crate,
//! implemented upstream.

use crate::error::StreamError;
use async_trait::async_trait;
use bytes::Bytes;
use cgw_types::ids::DataRoot;

/// Fetches one chunk of transaction data.
///
/// `tx_size`/`absolute_offset` locate the chunk in the weave;
/// `data_root`/`relative_offset` are its content-addressed identity, used by
/// [`crate::chunk_cache::ReadThroughChunkCache`] as the cache key.
#[async_trait]
pub trait ChunkSource: Send + Sync {
    async fn get_chunk(
        &self,
        tx_size: u64,
        absolute_offset: u64,
        data_root: DataRoot,
        relative_offset: u64,
    ) -> Result<Bytes, StreamError>;
}
