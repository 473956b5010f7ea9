//! `GqlQueryable` (spec §6), routed onto the read-only `gql` pool. The
//! planner's `QueryError` has no `From` conversion into `cgw_pool::PoolError`
//! (it's a leaf crate with its own cursor/SQL error surface), so every call
//! site here maps it by hand rather than via `?`-propagation through
//! `GatewayError::Query`.

use crate::error::GatewayError;
use crate::pools::Pools;
use async_trait::async_trait;
use cgw_pool::{PoolError, Role};
use cgw_query::{
    get_gql_block, get_gql_blocks, get_gql_search_by_tags, get_gql_transaction, get_gql_transactions, GqlBlockRef,
    GqlBlocksArgs, GqlTransactionNode, GqlTransactionsArgs, Page, TagMatchMode,
};
use cgw_types::ids::{BlockId, TxId};
use std::sync::Arc;

fn as_pool_error(err: cgw_query::QueryError) -> PoolError {
    PoolError::StoreUnavailable(err.to_string())
}

#[async_trait]
pub trait GqlQueryable: Send + Sync {
    async fn get_gql_transactions(&self, args: GqlTransactionsArgs) -> Result<Page<GqlTransactionNode>, GatewayError>;

    async fn get_gql_transaction(&self, id: TxId) -> Result<Option<GqlTransactionNode>, GatewayError>;

    async fn get_gql_search_by_tags(
        &self,
        args: GqlTransactionsArgs,
        mode: TagMatchMode,
    ) -> Result<Page<GqlTransactionNode>, GatewayError>;

    async fn get_gql_blocks(&self, args: GqlBlocksArgs) -> Result<Page<GqlBlockRef>, GatewayError>;

    async fn get_gql_block(&self, id: BlockId) -> Result<Option<GqlBlockRef>, GatewayError>;
}

pub struct StoreGqlQueryable {
    pools: Arc<Pools>,
}

impl StoreGqlQueryable {
    pub fn new(pools: Arc<Pools>) -> Self {
        Self { pools }
    }
}

#[async_trait]
impl GqlQueryable for StoreGqlQueryable {
    async fn get_gql_transactions(&self, args: GqlTransactionsArgs) -> Result<Page<GqlTransactionNode>, GatewayError> {
        Ok(self
            .pools
            .gql
            .submit(Role::Reader, move |conn| {
                get_gql_transactions(conn, &args).map_err(as_pool_error)
            })?
            .wait()
            .await?)
    }

    async fn get_gql_transaction(&self, id: TxId) -> Result<Option<GqlTransactionNode>, GatewayError> {
        Ok(self
            .pools
            .gql
            .submit(Role::Reader, move |conn| {
                get_gql_transaction(conn, &id).map_err(as_pool_error)
            })?
            .wait()
            .await?)
    }

    async fn get_gql_search_by_tags(
        &self,
        args: GqlTransactionsArgs,
        mode: TagMatchMode,
    ) -> Result<Page<GqlTransactionNode>, GatewayError> {
        Ok(self
            .pools
            .gql
            .submit(Role::Reader, move |conn| {
                get_gql_search_by_tags(conn, &args, mode).map_err(as_pool_error)
            })?
            .wait()
            .await?)
    }

    async fn get_gql_blocks(&self, args: GqlBlocksArgs) -> Result<Page<GqlBlockRef>, GatewayError> {
        Ok(self
            .pools
            .gql
            .submit(Role::Reader, move |conn| get_gql_blocks(conn, &args).map_err(as_pool_error))?
            .wait()
            .await?)
    }

    async fn get_gql_block(&self, id: BlockId) -> Result<Option<GqlBlockRef>, GatewayError> {
        Ok(self
            .pools
            .gql
            .submit(Role::Reader, move |conn| get_gql_block(conn, &id).map_err(as_pool_error))?
            .wait()
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain_index::{ChainIndex, CoreChainIndex};
    use crate::config::GatewayConfig;
    use cgw_store::core_store::IncomingTransaction;
    use cgw_store::open::StorePaths;
    use cgw_types::entities::{Block, Transaction};
    use cgw_types::ids::WalletAddress;
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

    #[tokio::test]
    async fn a_saved_transaction_is_queryable_by_id() {
        let (_dir, pools) = test_pools();
        let chain = CoreChainIndex::new(Arc::clone(&pools));
        let gql = StoreGqlQueryable::new(Arc::clone(&pools));

        let tx_id = TxId::try_from(vec![8u8; 32].as_slice()).unwrap();
        let block = Block {
            height: 1,
            indep_hash: BlockId::try_from(vec![1u8; 32].as_slice()).unwrap(),
            previous_block: None,
            nonce: vec![],
            mining_hash: vec![],
            timestamp: 1_700_000_000,
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
            tx_count: 1,
            missing_tx_count: 0,
        };
        let incoming = IncomingTransaction {
            transaction: Transaction {
                id: tx_id,
                signature: vec![],
                format: 2,
                last_tx: None,
                owner_address: WalletAddress::try_from(vec![2u8; 32].as_slice()).unwrap(),
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
        chain.save_block_and_txs(block, vec![incoming], vec![]).await.unwrap();

        let node = gql.get_gql_transaction(tx_id).await.unwrap().unwrap();
        assert_eq!(node.data_size, "0");
    }
}
