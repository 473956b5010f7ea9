//! `ContiguousDataIndex` and `NestedDataIndexWriter` (spec §6), routed onto
//! the `data` pool. `get_data_attributes`/`get_data_parent` each run behind
//! their own `CircuitBreaker`, per `cgw_stream::breaker`'s doc comment that
//! this crate's two call sites get independent instances.

use crate::error::GatewayError;
use crate::pools::Pools;
use async_trait::async_trait;
use cgw_pool::{PoolError, Role};
use cgw_store::data_store;
use cgw_stream::CircuitBreaker;
use cgw_types::entities::{DataAttributes, DataHash, NestedDataParent};
use cgw_types::ids::{ContentHash, DataItemId, DataRoot, TxId};
use std::sync::Arc;

/// The manifest content type this gateway recognizes; spec §3 leaves the
/// exact string to the deployment's convention, so this follows the
/// network's established media type rather than inventing a new one.
const MANIFEST_CONTENT_TYPE: &str = "application/x.arweave-manifest+json";

#[derive(Clone, Copy)]
pub enum DataAttributesKey {
    Id(TxId),
    Root(DataRoot),
}

#[async_trait]
pub trait ContiguousDataIndex: Send + Sync {
    async fn get_data_attributes(&self, key: DataAttributesKey) -> Result<Option<DataAttributes>, GatewayError>;

    async fn get_data_parent(&self, key: DataParentKey) -> Result<Option<NestedDataParent>, GatewayError>;

    async fn save_data_content_attributes(
        &self,
        hash: DataHash,
        id: Option<TxId>,
        data_root: Option<DataRoot>,
    ) -> Result<(), GatewayError>;
}

#[derive(Clone, Copy)]
pub enum DataParentKey {
    Id(DataItemId),
    Hash(ContentHash),
}

#[async_trait]
pub trait NestedDataIndexWriter: Send + Sync {
    async fn save_nested_data_id(
        &self,
        id: DataItemId,
        parent_id: DataItemId,
        data_offset: u64,
        data_size: Option<u64>,
    ) -> Result<(), GatewayError>;

    async fn save_nested_data_hash(
        &self,
        hash: ContentHash,
        parent_id: DataItemId,
        data_offset: u64,
    ) -> Result<(), GatewayError>;
}

pub struct StoreDataIndex {
    pools: Arc<Pools>,
    attributes_breaker: CircuitBreaker,
    parent_breaker: CircuitBreaker,
}

impl StoreDataIndex {
    pub fn new(pools: Arc<Pools>, circuit_breaker: cgw_stream::CircuitBreakerConfig) -> Self {
        Self {
            pools,
            attributes_breaker: CircuitBreaker::new("get_data_attributes", circuit_breaker.clone()),
            parent_breaker: CircuitBreaker::new("get_data_parent", circuit_breaker),
        }
    }

    async fn resolve_hash(&self, key: DataAttributesKey) -> Result<Option<DataHash>, GatewayError> {
        let pools = Arc::clone(&self.pools);
        match key {
            DataAttributesKey::Id(id) => Ok(pools
                .data
                .submit(Role::Reader, move |conn| {
                    data_store::get_data_attributes_by_id(conn, id).map_err(PoolError::from)
                })?
                .wait()
                .await?),
            DataAttributesKey::Root(root) => Ok(pools
                .data
                .submit(Role::Reader, move |conn| {
                    data_store::get_data_attributes_by_root(conn, root).map_err(PoolError::from)
                })?
                .wait()
                .await?),
        }
    }

    /// Whether the underlying upload has been promoted past the fork-depth
    /// window. The id-keyed path checks `core`/`bundles` directly by id; the
    /// root-keyed path can only match root-level transactions, since bundled
    /// data items carry no `data_root` of their own (spec §9 Open Question:
    /// `stable` for a nested item resolved only by root degrades to `false`
    /// rather than erroring).
    async fn resolve_stable(&self, key: DataAttributesKey) -> Result<bool, GatewayError> {
        let pools = Arc::clone(&self.pools);
        match key {
            DataAttributesKey::Id(id) => Ok(pools
                .core
                .submit(Role::Reader, move |conn| {
                    cgw_store::core_store::is_confirmed_stable(conn, id.as_bytes().as_slice()).map_err(PoolError::from)
                })?
                .wait()
                .await?),
            DataAttributesKey::Root(root) => Ok(pools
                .core
                .submit(Role::Reader, move |conn| {
                    cgw_store::core_store::is_confirmed_stable_by_root(conn, root.as_bytes().as_slice())
                        .map_err(PoolError::from)
                })?
                .wait()
                .await?),
        }
    }
}

#[async_trait]
impl ContiguousDataIndex for StoreDataIndex {
    async fn get_data_attributes(&self, key: DataAttributesKey) -> Result<Option<DataAttributes>, GatewayError> {
        let outcome = self
            .attributes_breaker
            .call(|| async {
                let hash = match self.resolve_hash(key).await? {
                    Some(hash) => hash,
                    None => return Ok(None),
                };
                let stable = self.resolve_stable(key).await?;
                let is_manifest = hash.original_source_content_type.as_deref() == Some(MANIFEST_CONTENT_TYPE);
                Ok(Some(DataAttributes {
                    hash: hash.hash,
                    data_size: hash.data_size,
                    content_type: hash.original_source_content_type,
                    is_manifest,
                    stable,
                    verified: hash.cached_at.is_some(),
                }))
            })
            .await?;
        Ok(outcome.flatten())
    }

    async fn get_data_parent(&self, key: DataParentKey) -> Result<Option<NestedDataParent>, GatewayError> {
        let pools = Arc::clone(&self.pools);
        let outcome = self
            .parent_breaker
            .call(|| async move {
                match key {
                    DataParentKey::Id(id) => Ok(pools
                        .data
                        .submit(Role::Reader, move |conn| {
                            data_store::get_data_parent_by_id(conn, id).map_err(PoolError::from)
                        })?
                        .wait()
                        .await?),
                    DataParentKey::Hash(hash) => Ok(pools
                        .data
                        .submit(Role::Reader, move |conn| {
                            data_store::get_data_parent_by_hash(conn, hash).map_err(PoolError::from)
                        })?
                        .wait()
                        .await?),
                }
            })
            .await?;
        Ok(outcome.flatten())
    }

    async fn save_data_content_attributes(
        &self,
        hash: DataHash,
        id: Option<TxId>,
        data_root: Option<DataRoot>,
    ) -> Result<(), GatewayError> {
        Ok(self
            .pools
            .data
            .submit(Role::Writer, move |conn| {
                data_store::save_data_content_attributes(conn, &hash, id, data_root).map_err(PoolError::from)
            })?
            .wait()
            .await?)
    }
}

#[async_trait]
impl NestedDataIndexWriter for StoreDataIndex {
    async fn save_nested_data_id(
        &self,
        id: DataItemId,
        parent_id: DataItemId,
        data_offset: u64,
        data_size: Option<u64>,
    ) -> Result<(), GatewayError> {
        Ok(self
            .pools
            .data
            .submit(Role::Writer, move |conn| {
                data_store::save_nested_data_id(conn, id, parent_id, data_offset, data_size).map_err(PoolError::from)
            })?
            .wait()
            .await?)
    }

    async fn save_nested_data_hash(
        &self,
        hash: ContentHash,
        parent_id: DataItemId,
        data_offset: u64,
    ) -> Result<(), GatewayError> {
        Ok(self
            .pools
            .data
            .submit(Role::Writer, move |conn| {
                data_store::save_nested_data_hash(conn, hash, parent_id, data_offset).map_err(PoolError::from)
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
    use tempfile::tempdir;

    fn test_index() -> (tempfile::TempDir, StoreDataIndex) {
        let dir = tempdir().unwrap();
        let paths = StorePaths {
            core: dir.path().join("core.db"),
            bundles: dir.path().join("bundles.db"),
            data: dir.path().join("data.db"),
            moderation: dir.path().join("moderation.db"),
        };
        let config = GatewayConfig::new(paths);
        let pools = Arc::new(Pools::new(&config));
        (dir, StoreDataIndex::new(pools, config.circuit_breaker))
    }

    #[tokio::test]
    async fn unknown_id_resolves_to_none_without_tripping_the_breaker() {
        let (_dir, index) = test_index();
        let id = TxId::try_from(vec![1u8; 32].as_slice()).unwrap();
        let result = index.get_data_attributes(DataAttributesKey::Id(id)).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn manifest_and_verified_flags_follow_the_stored_hash() {
        let (_dir, index) = test_index();
        let id = TxId::try_from(vec![2u8; 32].as_slice()).unwrap();
        let hash = DataHash {
            hash: ContentHash::try_from(vec![3u8; 32].as_slice()).unwrap(),
            data_size: 10,
            original_source_content_type: Some(MANIFEST_CONTENT_TYPE.to_string()),
            cached_at: Some(1_700_000_000),
            indexed_at: 1_700_000_000,
        };
        index.save_data_content_attributes(hash.clone(), Some(id), None).await.unwrap();

        let attrs = index
            .get_data_attributes(DataAttributesKey::Id(id))
            .await
            .unwrap()
            .unwrap();
        assert!(attrs.is_manifest);
        assert!(attrs.verified);
        assert!(!attrs.stable);
    }

    #[tokio::test]
    async fn nested_data_parent_round_trips_through_the_data_pool() {
        let (_dir, index) = test_index();
        let id = DataItemId::try_from(vec![4u8; 32].as_slice()).unwrap();
        let parent = DataItemId::try_from(vec![5u8; 32].as_slice()).unwrap();
        index.save_nested_data_id(id, parent, 64, Some(32)).await.unwrap();

        let resolved = index.get_data_parent(DataParentKey::Id(id)).await.unwrap().unwrap();
        assert_eq!(resolved.parent_id, parent);
        assert_eq!(resolved.data_offset, 64);
    }
}
