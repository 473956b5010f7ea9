//! The four-store persistence layer: `core` (chain + tx index), `bundles`
//! (data items, bundle records, filters), `data` (content-hash and
//! parent-offset index), `moderation` (id/hash blocklists). See spec §3, §4.1,
//! §4.2, §5.7.

pub mod bundles_store;
pub mod core_store;
pub mod data_store;
pub mod debug;
pub mod error;
pub mod moderation_store;
pub mod open;
pub mod schema;
pub mod staging;
pub mod statements;

pub use bundles_store::DimensionCache;
pub use error::StoreError;
pub use open::{open_store, StoreKind, StorePaths};
