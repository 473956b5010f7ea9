//! The chain-index lookups a [`crate::stream::get_tx_data`] caller provides.
//! Consumed by this crate, implemented upstream (by `cgw-gateway`, backed by
//! `cgw-store`) — see spec §4.5.

use crate::error::StreamError;
use async_trait::async_trait;
use cgw_types::ids::{DataRoot, TxId};

/// A transaction's data root and its `(offset, size)` in the weave.
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn get_data_root(&self, tx_id: TxId) -> Result<DataRoot, StreamError>;

    /// Returns `(offset, size)`: `offset` is the absolute weave offset of
    /// the transaction's last byte, `size` is its byte length.
    async fn get_offset(&self, tx_id: TxId) -> Result<(u64, u64), StreamError>;
}
