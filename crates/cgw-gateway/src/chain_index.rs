//! `ChainIndex` and `ChainOffsetIndex` (spec §6), routed onto the `core`
//! pool's reader/writer roles.

use crate::error::GatewayError;
use crate::pools::Pools;
use async_trait::async_trait;
use cgw_pool::{PoolError, Role};
use cgw_store::core_store::{self, IncomingTransaction};
use cgw_types::entities::Block;
use cgw_types::ids::{BlockId, TxId};
use std::sync::Arc;

#[async_trait]
pub trait ChainIndex: Send + Sync {
    async fn save_block_and_txs(
        &self,
        block: Block,
        txs: Vec<IncomingTransaction>,
        missing_tx_ids: Vec<TxId>,
    ) -> Result<bool, GatewayError>;

    async fn save_tx(&self, tx: IncomingTransaction) -> Result<(), GatewayError>;

    async fn reset_to_height(&self, height: u64) -> Result<(), GatewayError>;

    async fn get_max_height(&self) -> Result<Option<u64>, GatewayError>;

    async fn get_block_hash_by_height(&self, height: u64) -> Result<Option<BlockId>, GatewayError>;

    async fn get_missing_tx_ids(&self) -> Result<Vec<TxId>, GatewayError>;
}

#[async_trait]
pub trait ChainOffsetIndex: Send + Sync {
    async fn get_tx_ids_missing_offsets(&self) -> Result<Vec<TxId>, GatewayError>;

    async fn save_tx_offset(&self, tx_id: TxId, offset: u64, size: u64) -> Result<(), GatewayError>;
}

pub struct CoreChainIndex {
    pools: Arc<Pools>,
}

impl CoreChainIndex {
    pub fn new(pools: Arc<Pools>) -> Self {
        Self { pools }
    }
}

#[async_trait]
impl ChainIndex for CoreChainIndex {
    /// Inserts the block/txs, then — when the insert signals
    /// `height % STABLE_FLUSH_INTERVAL == 0` — runs the promotion sweep on
    /// both `core` and `bundles` before returning, so callers never need to
    /// drive staging themselves (spec §4.2). The sweep is two separate
    /// writer-role jobs (one per pool) rather than one cross-store
    /// transaction, matching §4.1/§9's note that cross-store atomicity isn't
    /// required here.
    async fn save_block_and_txs(
        &self,
        block: Block,
        txs: Vec<IncomingTransaction>,
        missing_tx_ids: Vec<TxId>,
    ) -> Result<bool, GatewayError> {
        let height = block.height;
        let promote_due = self
            .pools
            .core
            .submit(Role::Writer, move |conn| {
                core_store::save_block_and_txs(conn, &block, &txs, &missing_tx_ids).map_err(PoolError::from)
            })?
            .wait()
            .await?;

        if promote_due {
            let checkpoint = self
                .pools
                .core
                .submit(Role::Writer, move |conn| {
                    cgw_store::staging::promote_core(conn, height).map_err(PoolError::from)
                })?
                .wait()
                .await?;
            self.pools
                .bundles
                .submit(Role::Writer, move |conn| {
                    cgw_store::staging::promote_bundles(conn, checkpoint).map_err(PoolError::from)
                })?
                .wait()
                .await?;
        }

        Ok(promote_due)
    }

    async fn save_tx(&self, tx: IncomingTransaction) -> Result<(), GatewayError> {
        Ok(self
            .pools
            .core
            .submit(Role::Writer, move |conn| {
                core_store::save_tx(conn, tx).map_err(PoolError::from)
            })?
            .wait()
            .await?)
    }

    async fn reset_to_height(&self, height: u64) -> Result<(), GatewayError> {
        Ok(self
            .pools
            .core
            .submit(Role::Writer, move |conn| {
                core_store::reset_to_height(conn, height).map_err(PoolError::from)
            })?
            .wait()
            .await?)
    }

    async fn get_max_height(&self) -> Result<Option<u64>, GatewayError> {
        Ok(self
            .pools
            .core
            .submit(Role::Reader, |conn| core_store::get_max_height(conn).map_err(PoolError::from))?
            .wait()
            .await?)
    }

    async fn get_block_hash_by_height(&self, height: u64) -> Result<Option<BlockId>, GatewayError> {
        Ok(self
            .pools
            .core
            .submit(Role::Reader, move |conn| {
                core_store::get_block_hash_by_height(conn, height).map_err(PoolError::from)
            })?
            .wait()
            .await?)
    }

    async fn get_missing_tx_ids(&self) -> Result<Vec<TxId>, GatewayError> {
        Ok(self
            .pools
            .core
            .submit(Role::Reader, |conn| {
                core_store::get_missing_tx_ids(conn).map_err(PoolError::from)
            })?
            .wait()
            .await?)
    }
}

#[async_trait]
impl ChainOffsetIndex for CoreChainIndex {
    async fn get_tx_ids_missing_offsets(&self) -> Result<Vec<TxId>, GatewayError> {
        Ok(self
            .pools
            .core
            .submit(Role::Reader, |conn| {
                core_store::get_tx_ids_missing_offsets(conn).map_err(PoolError::from)
            })?
            .wait()
            .await?)
    }

    async fn save_tx_offset(&self, tx_id: TxId, offset: u64, size: u64) -> Result<(), GatewayError> {
        Ok(self
            .pools
            .core
            .submit(Role::Writer, move |conn| {
                core_store::save_tx_offset(conn, tx_id, offset, size).map_err(PoolError::from)
            })?
            .wait()
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use cgw_store::open::StorePaths;
    use cgw_types::entities::Transaction;
    use cgw_types::ids::{BlockId as BId, WalletAddress};
    use tempfile::tempdir;

    fn test_pools() -> (tempfile::TempDir, Arc<Pools>) {
        let dir = tempdir().unwrap();
        let paths = StorePaths {
            core: dir.path().join("core.db"),
            bundles: dir.path().join("bundles.db"),
            data: dir.path().join("data.db"),
            moderation: dir.path().join("moderation.db"),
        };
        let config = GatewayConfig::new(paths);
        (dir, Arc::new(Pools::new(&config)))
    }

    fn sample_block(height: u64) -> Block {
        Block {
            height,
            indep_hash: BId::try_from(vec![height as u8; 32].as_slice()).unwrap(),
            previous_block: None,
            nonce: vec![],
            mining_hash: vec![],
            timestamp: 1_700_000_000 + height as i64,
            difficulty: "1".into(),
            cumulative_difficulty: "1".into(),
            last_retarget: 0,
            reward_address: None,
            reward_pool: "0".into(),
            block_size: 0,
            weave_size: 0,
            usd_to_token_rate: (1, 1),
            scheduled_usd_to_token_rate: (1, 1),
            hash_list_merkle: None,
            wallet_list_hash: vec![],
            tx_root: None,
            tx_count: 0,
            missing_tx_count: 0,
        }
    }

    #[tokio::test]
    async fn save_block_and_read_back_height_and_hash() {
        let (_dir, pools) = test_pools();
        let index = CoreChainIndex::new(pools);

        let block = sample_block(1);
        let promote = index.save_block_and_txs(block.clone(), vec![], vec![]).await.unwrap();
        assert!(!promote);

        assert_eq!(index.get_max_height().await.unwrap(), Some(1));
        assert_eq!(index.get_block_hash_by_height(1).await.unwrap(), Some(block.indep_hash));
    }

    #[tokio::test]
    async fn tx_offsets_round_trip_through_the_pool() {
        let (_dir, pools) = test_pools();
        let index = CoreChainIndex::new(pools);

        let tx_id = TxId::try_from(vec![4u8; 32].as_slice()).unwrap();
        let incoming = IncomingTransaction {
            transaction: Transaction {
                id: tx_id,
                signature: vec![],
                format: 2,
                last_tx: None,
                owner_address: WalletAddress::try_from(vec![1u8; 32].as_slice()).unwrap(),
                target: None,
                quantity: "0".into(),
                reward: "0".into(),
                data_size: 0,
                data_root: None,
                tag_count: 0,
                content_type: None,
                created_at: 1_700_000_000,
                indexed_at: 1_700_000_000,
                height: Some(1),
            },
            tags: vec![],
        };
        index
            .save_block_and_txs(sample_block(1), vec![incoming], vec![])
            .await
            .unwrap();

        assert_eq!(index.get_tx_ids_missing_offsets().await.unwrap(), vec![tx_id]);
        index.save_tx_offset(tx_id, 1000, 500).await.unwrap();
        assert!(index.get_tx_ids_missing_offsets().await.unwrap().is_empty());
    }
}
