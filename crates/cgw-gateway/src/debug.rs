//! `getDebugInfo` (spec §6/§4.7), routed onto the `debug` pool. That pool
//! opens plain `StoreKind::Core` connections, which already have `bundles`
//! attached, so the same connection stands in for both of
//! `get_debug_info`'s `core`/`bundles` parameters (see `pools.rs`).

use crate::error::GatewayError;
use crate::pools::Pools;
use async_trait::async_trait;
use cgw_pool::{PoolError, Role};
use cgw_store::debug::{self, DebugInfo};
use std::sync::Arc;

#[async_trait]
pub trait DebugIndex: Send + Sync {
    async fn get_debug_info(&self, now: i64) -> Result<DebugInfo, GatewayError>;
}

pub struct StoreDebugIndex {
    pools: Arc<Pools>,
}

impl StoreDebugIndex {
    pub fn new(pools: Arc<Pools>) -> Self {
        Self { pools }
    }
}

#[async_trait]
impl DebugIndex for StoreDebugIndex {
    async fn get_debug_info(&self, now: i64) -> Result<DebugInfo, GatewayError> {
        Ok(self
            .pools
            .debug
            .submit(Role::Reader, move |conn| {
                debug::get_debug_info(conn, conn, now).map_err(PoolError::from)
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

    #[tokio::test]
    async fn clean_store_reports_no_errors_or_warnings() {
        let dir = tempdir().unwrap();
        let paths = StorePaths {
            core: dir.path().join("core.db"),
            bundles: dir.path().join("bundles.db"),
            data: dir.path().join("data.db"),
            moderation: dir.path().join("moderation.db"),
        };
        let config = GatewayConfig::new(paths);
        let index = StoreDebugIndex::new(Arc::new(Pools::new(&config)));

        let info = index.get_debug_info(1_700_000_000).await.unwrap();
        assert!(info.errors.is_empty());
        assert!(info.warnings.is_empty());
    }
}
