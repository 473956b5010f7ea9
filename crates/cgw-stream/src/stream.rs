//! `getTxData`: concurrently resolves a transaction's location, then emits
//! its bytes chunk by chunk. See spec §4.5.

use crate::chain_source::ChainSource;
use crate::chunk_source::ChunkSource;
use crate::error::StreamError;
use bytes::Bytes;
use cgw_types::ids::{DataRoot, TxId};
use futures::stream::{self, Stream};
use std::pin::Pin;
use std::sync::Arc;

/// A transaction's data, as a backpressure-aware byte stream plus its
/// declared size. The stream yields chunks in order; requesting chunk N+1
/// only happens after chunk N has been pushed downstream, since the
/// underlying `stream::unfold` state carries the running byte count and
/// each poll awaits exactly one `ChunkSource::get_chunk` call.
pub struct TxData {
    pub stream: Pin<Box<dyn Stream<Item = Result<Bytes, StreamError>> + Send>>,
    pub size: u64,
}

struct UnfoldState {
    chunks: Arc<dyn ChunkSource>,
    data_root: DataRoot,
    tx_size: u64,
    start_offset: u64,
    bytes_read: u64,
    failed: bool,
}

pub async fn get_tx_data(
    chain: Arc<dyn ChainSource>,
    chunks: Arc<dyn ChunkSource>,
    tx_id: TxId,
) -> Result<TxData, StreamError> {
    let (data_root, offset_size) = tokio::try_join!(chain.get_data_root(tx_id), chain.get_offset(tx_id))?;
    let (offset, size) = offset_size;
    // startOffset = offset - size + 1 (spec §4.5).
    let start_offset = offset.saturating_sub(size).saturating_add(1);

    let state = UnfoldState {
        chunks,
        data_root,
        tx_size: size,
        start_offset,
        bytes_read: 0,
        failed: false,
    };

    let stream = stream::unfold(state, |mut state| async move {
        if state.failed || state.bytes_read >= state.tx_size {
            return None;
        }
        let absolute_offset = state.start_offset + state.bytes_read;
        let relative_offset = state.bytes_read;
        match state
            .chunks
            .get_chunk(state.tx_size, absolute_offset, state.data_root, relative_offset)
            .await
        {
            Ok(chunk) => {
                state.bytes_read += chunk.len() as u64;
                Some((Ok(chunk), state))
            }
            Err(e) => {
                // Any fetch failure destroys the stream (spec §4.5): yield
                // the error once, then end on the next poll.
                state.failed = true;
                Some((Err(e), state))
            }
        }
    });

    Ok(TxData {
        stream: Box::pin(stream),
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct FixedChain {
        data_root: DataRoot,
        offset: u64,
        size: u64,
    }

    #[async_trait]
    impl ChainSource for FixedChain {
        async fn get_data_root(&self, _tx_id: TxId) -> Result<DataRoot, StreamError> {
            Ok(self.data_root)
        }
        async fn get_offset(&self, _tx_id: TxId) -> Result<(u64, u64), StreamError> {
            Ok((self.offset, self.size))
        }
    }

    struct OrderCheckingChunks {
        chunk_size: u64,
        last_relative_offset_seen: AtomicU64,
        calls: AtomicU64,
    }

    #[async_trait]
    impl ChunkSource for OrderCheckingChunks {
        async fn get_chunk(
            &self,
            tx_size: u64,
            _absolute_offset: u64,
            _data_root: DataRoot,
            relative_offset: u64,
        ) -> Result<Bytes, StreamError> {
            let calls = self.calls.fetch_add(1, Ordering::SeqCst);
            if calls > 0 {
                let expected = self.last_relative_offset_seen.load(Ordering::SeqCst) + self.chunk_size;
                assert_eq!(relative_offset, expected, "chunk requested out of order");
            }
            self.last_relative_offset_seen.store(relative_offset, Ordering::SeqCst);
            let remaining = tx_size - relative_offset;
            let len = self.chunk_size.min(remaining);
            Ok(Bytes::from(vec![0u8; len as usize]))
        }
    }

    #[tokio::test]
    async fn stream_length_matches_declared_size() {
        let chain = Arc::new(FixedChain {
            data_root: DataRoot::zero(),
            offset: 999,
            size: 10,
        });
        let chunks = Arc::new(OrderCheckingChunks {
            chunk_size: 4,
            last_relative_offset_seen: AtomicU64::new(0),
            calls: AtomicU64::new(0),
        });

        let tx_data = get_tx_data(chain, chunks, TxId::zero()).await.unwrap();
        assert_eq!(tx_data.size, 10);

        let bytes: Vec<Bytes> = tx_data.stream.map(|r| r.unwrap()).collect().await;
        let total: usize = bytes.iter().map(|b| b.len()).sum();
        assert_eq!(total as u64, tx_data.size);
    }

    struct FailingChunks;

    #[async_trait]
    impl ChunkSource for FailingChunks {
        async fn get_chunk(
            &self,
            _tx_size: u64,
            _absolute_offset: u64,
            _data_root: DataRoot,
            relative_offset: u64,
        ) -> Result<Bytes, StreamError> {
            Err(StreamError::ChunkFetch {
                relative_offset,
                message: "unreachable".into(),
            })
        }
    }

    #[tokio::test]
    async fn fetch_failure_destroys_the_stream() {
        let chain = Arc::new(FixedChain {
            data_root: DataRoot::zero(),
            offset: 999,
            size: 10,
        });
        let tx_data = get_tx_data(chain, Arc::new(FailingChunks), TxId::zero()).await.unwrap();

        let results: Vec<Result<Bytes, StreamError>> = tx_data.stream.collect().await;
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
