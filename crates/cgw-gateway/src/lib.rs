//! The gateway-facing facade (spec §6): wires the four stores behind their
//! worker pools and exposes the capability sets the rest of the gateway
//! process calls (`ChainIndex`, `ChainOffsetIndex`, `BundleIndex`,
//! `ContiguousDataIndex`, `NestedDataIndexWriter`, `BlockListValidator`,
//! `GqlQueryable`), plus the debug/health surface of spec §4.7.
//!
//! Everything upstream of this crate (chain polling, fork detection, bundle
//! unbundling, HTTP/GraphQL transport) is out of scope per spec §1; `Gateway`
//! only owns the pools and the capability-set objects built on top of them.

pub mod bundle_index;
pub mod chain_index;
pub mod config;
pub mod data_index;
pub mod debug;
pub mod error;
pub mod gql;
pub mod moderation;
pub mod pools;

pub use bundle_index::{BundleIndex, StoreBundleIndex};
pub use chain_index::{ChainIndex, ChainOffsetIndex, CoreChainIndex};
pub use config::{GatewayConfig, PoolSizes, PoolSizing};
pub use data_index::{ContiguousDataIndex, DataAttributesKey, DataParentKey, NestedDataIndexWriter, StoreDataIndex};
pub use debug::{DebugIndex, StoreDebugIndex};
pub use error::GatewayError;
pub use gql::{GqlQueryable, StoreGqlQueryable};
pub use moderation::{BlockListValidator, StoreBlockListValidator};
pub use pools::Pools;

use std::sync::Arc;

/// Composes every capability set behind one set of pools. This is the type
/// the rest of the gateway process constructs and holds onto; each
/// capability is also reachable as its own trait object for callers that
/// only need one facet (e.g. the GraphQL layer only needs `GqlQueryable`).
pub struct Gateway {
    pools: Arc<Pools>,
    chain: CoreChainIndex,
    bundles: StoreBundleIndex,
    data: StoreDataIndex,
    moderation: StoreBlockListValidator,
    gql: StoreGqlQueryable,
    debug: StoreDebugIndex,
}

impl Gateway {
    /// Opens every store connection, spins up the six worker pools (spec
    /// §4.3), and returns the composed facade. Construction does not block
    /// on store I/O beyond opening the first connection per worker; ingestion
    /// and queries are dispatched through the pools from here on.
    pub fn new(config: GatewayConfig) -> Self {
        let pools = Arc::new(Pools::new(&config));
        Self {
            chain: CoreChainIndex::new(Arc::clone(&pools)),
            bundles: StoreBundleIndex::new(Arc::clone(&pools)),
            data: StoreDataIndex::new(Arc::clone(&pools), config.circuit_breaker.clone()),
            moderation: StoreBlockListValidator::new(Arc::clone(&pools)),
            gql: StoreGqlQueryable::new(Arc::clone(&pools)),
            debug: StoreDebugIndex::new(Arc::clone(&pools)),
            pools,
        }
    }

    pub fn chain_index(&self) -> &dyn ChainIndex {
        &self.chain
    }

    pub fn chain_offset_index(&self) -> &dyn ChainOffsetIndex {
        &self.chain
    }

    pub fn bundle_index(&self) -> &dyn BundleIndex {
        &self.bundles
    }

    pub fn contiguous_data_index(&self) -> &dyn ContiguousDataIndex {
        &self.data
    }

    pub fn nested_data_index_writer(&self) -> &dyn NestedDataIndexWriter {
        &self.data
    }

    pub fn block_list_validator(&self) -> &dyn BlockListValidator {
        &self.moderation
    }

    pub fn gql_queryable(&self) -> &dyn GqlQueryable {
        &self.gql
    }

    pub fn debug_index(&self) -> &dyn DebugIndex {
        &self.debug
    }

    /// Shuts down every pool's workers, joining their threads. Consumes the
    /// gateway so no further dispatch is possible afterward.
    pub fn shutdown(self) {
        // `Arc::try_unwrap` requires every capability-set object (which each
        // hold their own clone of the `Arc<Pools>`) to be dropped first.
        drop(self.chain);
        drop(self.bundles);
        drop(self.data);
        drop(self.moderation);
        drop(self.gql);
        drop(self.debug);
        match Arc::try_unwrap(self.pools) {
            Ok(pools) => pools.shutdown(),
            Err(_) => tracing::warn!("gateway shutdown: pools still shared, workers left running"),
        }
    }
}
