//! `BlockListValidator` (spec §6), routed onto the `moderation` pool.

use crate::error::GatewayError;
use crate::pools::Pools;
use async_trait::async_trait;
use cgw_pool::{PoolError, Role};
use cgw_store::moderation_store;
use cgw_types::ids::ContentHash;
use std::sync::Arc;

#[async_trait]
pub trait BlockListValidator: Send + Sync {
    async fn is_id_blocked(&self, id: Vec<u8>) -> Result<bool, GatewayError>;

    async fn is_hash_blocked(&self, hash: ContentHash) -> Result<bool, GatewayError>;

    async fn block_data(
        &self,
        id: Option<Vec<u8>>,
        hash: Option<ContentHash>,
        source: Option<String>,
        notes: Option<String>,
    ) -> Result<(), GatewayError>;
}

pub struct StoreBlockListValidator {
    pools: Arc<Pools>,
}

impl StoreBlockListValidator {
    pub fn new(pools: Arc<Pools>) -> Self {
        Self { pools }
    }
}

#[async_trait]
impl BlockListValidator for StoreBlockListValidator {
    async fn is_id_blocked(&self, id: Vec<u8>) -> Result<bool, GatewayError> {
        Ok(self
            .pools
            .moderation
            .submit(Role::Reader, move |conn| {
                moderation_store::is_id_blocked(conn, &id).map_err(PoolError::from)
            })?
            .wait()
            .await?)
    }

    async fn is_hash_blocked(&self, hash: ContentHash) -> Result<bool, GatewayError> {
        Ok(self
            .pools
            .moderation
            .submit(Role::Reader, move |conn| {
                moderation_store::is_hash_blocked(conn, hash).map_err(PoolError::from)
            })?
            .wait()
            .await?)
    }

    async fn block_data(
        &self,
        id: Option<Vec<u8>>,
        hash: Option<ContentHash>,
        source: Option<String>,
        notes: Option<String>,
    ) -> Result<(), GatewayError> {
        Ok(self
            .pools
            .moderation
            .submit(Role::Writer, move |conn| {
                moderation_store::block_data(conn, id.as_deref(), hash, source.as_deref(), notes.as_deref())
                    .map_err(PoolError::from)
            })?
            .wait()
            .await?)
    }
}
