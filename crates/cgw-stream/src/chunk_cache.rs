//! Read-through cache wrapping a [`ChunkSource`], keyed by
//! `(DataRoot, relativeOffset)` rather than absolute offset: the same chunk
//! content is shared by every transaction that overlaps it, but its
//! absolute weave offset is tx-instance-specific. See spec §4.5.

use crate::chunk_source::ChunkSource;
use crate::error::StreamError;
use async_trait::async_trait;
use bytes::Bytes;
use cgw_types::constants::CHUNK_CACHE_CAPACITY;
use cgw_types::ids::DataRoot;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

type CacheKey = (DataRoot, u64);

pub struct ReadThroughChunkCache<S> {
    inner: S,
    cache: Mutex<LruCache<CacheKey, Bytes>>,
}

impl<S: ChunkSource> ReadThroughChunkCache<S> {
    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, CHUNK_CACHE_CAPACITY)
    }

    pub fn with_capacity(inner: S, capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            inner,
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<S: ChunkSource> ChunkSource for ReadThroughChunkCache<S> {
    async fn get_chunk(
        &self,
        tx_size: u64,
        absolute_offset: u64,
        data_root: DataRoot,
        relative_offset: u64,
    ) -> Result<Bytes, StreamError> {
        let key = (data_root, relative_offset);
        if let Some(hit) = self.cache.lock().get(&key).cloned() {
            return Ok(hit);
        }

        let chunk = self
            .inner
            .get_chunk(tx_size, absolute_offset, data_root, relative_offset)
            .await?;
        self.cache.lock().put(key, chunk.clone());
        Ok(chunk)
    }
}
