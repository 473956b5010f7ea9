//! Wires the six worker pools spec §4.3 calls for, each backed by a
//! `ConnFactory` closure that opens its own store connection. One `Pools`
//! per `GatewayConfig`; every capability-set impl in this crate borrows
//! from it.

use crate::config::GatewayConfig;
use cgw_pool::{Pool, PoolError};
use cgw_store::open::{open_store, StoreKind, StorePaths};
use rusqlite::Connection;
use std::sync::Arc;

fn factory(kind: StoreKind, paths: StorePaths) -> Arc<dyn cgw_pool::ConnFactory<Connection>> {
    Arc::new(move || open_store(kind, &paths).map_err(|e| PoolError::StoreUnavailable(e.to_string())))
}

/// The six pools behind the capability sets: `core`, `data`, `moderation`
/// and `bundles` each carry a reader and writer role; `debug` and `gql` are
/// read-only.
pub struct Pools {
    pub core: Pool<Connection>,
    pub data: Pool<Connection>,
    pub moderation: Pool<Connection>,
    pub bundles: Pool<Connection>,
    pub debug: Pool<Connection>,
    pub gql: Pool<Connection>,
}

impl Pools {
    pub fn new(config: &GatewayConfig) -> Self {
        let sizes = config.pool_sizes;
        let paths = &config.store_paths;

        Self {
            core: Pool::new(
                "core",
                sizes.core.readers,
                sizes.core.writers,
                factory(StoreKind::Core, paths.clone()),
                config.max_worker_errors,
                config.max_queue_depth,
            ),
            data: Pool::new(
                "data",
                sizes.data.readers,
                sizes.data.writers,
                factory(StoreKind::Data, paths.clone()),
                config.max_worker_errors,
                config.max_queue_depth,
            ),
            moderation: Pool::new(
                "moderation",
                sizes.moderation.readers,
                sizes.moderation.writers,
                factory(StoreKind::Moderation, paths.clone()),
                config.max_worker_errors,
                config.max_queue_depth,
            ),
            bundles: Pool::new(
                "bundles",
                sizes.bundles.readers,
                sizes.bundles.writers,
                factory(StoreKind::Bundles, paths.clone()),
                config.max_worker_errors,
                config.max_queue_depth,
            ),
            debug: Pool::new(
                "debug",
                sizes.debug.readers,
                sizes.debug.writers,
                factory(StoreKind::Core, paths.clone()),
                config.max_worker_errors,
                config.max_queue_depth,
            ),
            gql: Pool::new(
                "gql",
                sizes.gql.readers,
                sizes.gql.writers,
                factory(StoreKind::Core, paths.clone()),
                config.max_worker_errors,
                config.max_queue_depth,
            ),
        }
    }

    /// Closes every pool's queues and joins its worker threads.
    pub fn shutdown(self) {
        self.core.shutdown();
        self.data.shutdown();
        self.moderation.shutdown();
        self.bundles.shutdown();
        self.debug.shutdown();
        self.gql.shutdown();
    }
}
