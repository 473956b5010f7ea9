//! `BundleIndex` (spec §6), routed onto the `bundles` pool.
//!
//! `updateBundlesFullyIndexedAt` goes through the writer role even though
//! its underlying statement is a single-row `UPDATE` a reader connection
//! could in principle run: SQLite's reader/writer split is about whether a
//! connection holds the lock that serializes it against every other write,
//! and this marks bundle completion, a state transition other ingestion
//! writers must see in the order it was applied (spec §9 Open Question
//! resolution — see `DESIGN.md`).

use crate::error::GatewayError;
use crate::pools::Pools;
use async_trait::async_trait;
use cgw_pool::{PoolError, Role};
use cgw_store::bundles_store::{self, DimensionCache};
use cgw_types::entities::{BundleRecord, DataItem, Tag};
use cgw_types::ids::TxId;
use std::sync::Arc;

#[async_trait]
pub trait BundleIndex: Send + Sync {
    async fn save_data_item(&self, item: DataItem, tags: Vec<Tag>) -> Result<(), GatewayError>;

    async fn save_bundle(&self, record: BundleRecord) -> Result<(), GatewayError>;

    async fn get_failed_bundle_ids(&self) -> Result<Vec<TxId>, GatewayError>;

    async fn backfill_bundles(&self, now: i64) -> Result<Vec<TxId>, GatewayError>;

    async fn update_bundles_fully_indexed_at(&self, id: TxId, timestamp: i64) -> Result<(), GatewayError>;

    async fn update_bundles_for_filter_change(
        &self,
        id: TxId,
        unbundle_filter: Option<String>,
        index_filter: Option<String>,
    ) -> Result<(), GatewayError>;
}

pub struct StoreBundleIndex {
    pools: Arc<Pools>,
    cache: Arc<DimensionCache>,
}

impl StoreBundleIndex {
    pub fn new(pools: Arc<Pools>) -> Self {
        Self {
            pools,
            cache: Arc::new(DimensionCache::new()),
        }
    }
}

#[async_trait]
impl BundleIndex for StoreBundleIndex {
    async fn save_data_item(&self, item: DataItem, tags: Vec<Tag>) -> Result<(), GatewayError> {
        let cache = Arc::clone(&self.cache);
        Ok(self
            .pools
            .bundles
            .submit(Role::Writer, move |conn| {
                bundles_store::save_data_item(conn, &cache, &item, &tags).map_err(PoolError::from)
            })?
            .wait()
            .await?)
    }

    async fn save_bundle(&self, record: BundleRecord) -> Result<(), GatewayError> {
        let cache = Arc::clone(&self.cache);
        Ok(self
            .pools
            .bundles
            .submit(Role::Writer, move |conn| {
                bundles_store::save_bundle(conn, &cache, &record).map_err(PoolError::from)
            })?
            .wait()
            .await?)
    }

    async fn get_failed_bundle_ids(&self) -> Result<Vec<TxId>, GatewayError> {
        Ok(self
            .pools
            .bundles
            .submit(Role::Reader, |conn| {
                bundles_store::get_failed_bundle_ids(conn).map_err(PoolError::from)
            })?
            .wait()
            .await?)
    }

    async fn backfill_bundles(&self, now: i64) -> Result<Vec<TxId>, GatewayError> {
        Ok(self
            .pools
            .bundles
            .submit(Role::Reader, move |conn| {
                bundles_store::backfill_bundles(conn, now).map_err(PoolError::from)
            })?
            .wait()
            .await?)
    }

    async fn update_bundles_fully_indexed_at(&self, id: TxId, timestamp: i64) -> Result<(), GatewayError> {
        Ok(self
            .pools
            .bundles
            .submit(Role::Writer, move |conn| {
                bundles_store::update_bundles_fully_indexed_at(conn, id, timestamp).map_err(PoolError::from)
            })?
            .wait()
            .await?)
    }

    async fn update_bundles_for_filter_change(
        &self,
        id: TxId,
        unbundle_filter: Option<String>,
        index_filter: Option<String>,
    ) -> Result<(), GatewayError> {
        let cache = Arc::clone(&self.cache);
        Ok(self
            .pools
            .bundles
            .submit(Role::Writer, move |conn| {
                bundles_store::update_bundles_for_filter_change(
                    conn,
                    &cache,
                    id,
                    unbundle_filter.as_deref(),
                    index_filter.as_deref(),
                )
                .map_err(PoolError::from)
            })?
            .wait()
            .await?)
    }
}
