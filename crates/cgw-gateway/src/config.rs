//! `GatewayConfig`: store paths plus every tuning knob spec §5 calls out,
//! each defaulted to the constant `cgw-types` bakes in. Nothing here is
//! hardcoded into the pools or stores themselves — they take whatever this
//! struct resolves to.

use cgw_store::open::StorePaths;
use cgw_stream::CircuitBreakerConfig;
use cgw_types::constants::{
    BUNDLE_REPROCESS_WAIT, MAX_FORK_DEPTH, MAX_WORKER_COUNT, MAX_WORKER_ERRORS, NEW_DATA_ITEM_CLEANUP_WAIT,
    NEW_TX_CLEANUP_WAIT, STABLE_FLUSH_INTERVAL,
};
use std::time::Duration;

/// Reader/writer counts for one store's pool (spec §4.3 "Worker pool").
#[derive(Debug, Clone, Copy)]
pub struct PoolSizing {
    pub readers: usize,
    pub writers: usize,
}

/// Every pool the gateway maintains, sized per spec §4.3's table: `core`
/// 1R/1W, `data` 2R/1W, `moderation` 1R/1W, `bundles` 1R/1W, `debug` 1R/0W,
/// `gql` `min(cpu, MAX_WORKER_COUNT)`R/0W.
#[derive(Debug, Clone, Copy)]
pub struct PoolSizes {
    pub core: PoolSizing,
    pub data: PoolSizing,
    pub moderation: PoolSizing,
    pub bundles: PoolSizing,
    pub debug: PoolSizing,
    pub gql: PoolSizing,
}

impl Default for PoolSizes {
    fn default() -> Self {
        let gql_readers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(MAX_WORKER_COUNT);
        Self {
            core: PoolSizing { readers: 1, writers: 1 },
            data: PoolSizing { readers: 2, writers: 1 },
            moderation: PoolSizing { readers: 1, writers: 1 },
            bundles: PoolSizing { readers: 1, writers: 1 },
            debug: PoolSizing { readers: 1, writers: 0 },
            gql: PoolSizing {
                readers: gql_readers,
                writers: 0,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub store_paths: StorePaths,
    pub max_fork_depth: u64,
    pub stable_flush_interval: u64,
    pub new_tx_cleanup_wait: Duration,
    pub new_data_item_cleanup_wait: Duration,
    pub bundle_reprocess_wait: Duration,
    pub pool_sizes: PoolSizes,
    pub max_worker_errors: u32,
    /// Bounds each pool's FIFO queue depth (spec §9 Open Question); `None`
    /// keeps the unbounded behavior `cgw-pool` defaults to.
    pub max_queue_depth: Option<usize>,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl GatewayConfig {
    /// Every tuning knob at its `cgw-types::constants` default, against the
    /// four store files rooted at `store_paths`.
    pub fn new(store_paths: StorePaths) -> Self {
        Self {
            store_paths,
            max_fork_depth: MAX_FORK_DEPTH,
            stable_flush_interval: STABLE_FLUSH_INTERVAL,
            new_tx_cleanup_wait: NEW_TX_CLEANUP_WAIT,
            new_data_item_cleanup_wait: NEW_DATA_ITEM_CLEANUP_WAIT,
            bundle_reprocess_wait: BUNDLE_REPROCESS_WAIT,
            pool_sizes: PoolSizes::default(),
            max_worker_errors: MAX_WORKER_ERRORS,
            max_queue_depth: None,
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}
