//! Tuning constants shared by every crate in the workspace.
//!
//! See spec §6 "Constants". These are the defaults baked into
//! `GatewayConfig`; nothing here is hardcoded into query or ingestion SQL.

use std::time::Duration;

/// Default maximum depth at which the chain is allowed to reorganize.
pub const MAX_FORK_DEPTH: u64 = 50;

/// Blocks between stable-promotion sweeps.
pub const STABLE_FLUSH_INTERVAL: u64 = 5;

/// Grace window before a cleaned-up `new_transactions` row is eligible for
/// deletion even if its height is still above the promotion threshold.
pub const NEW_TX_CLEANUP_WAIT: Duration = Duration::from_secs(2 * 60 * 60);

/// Grace window for `new_data_items`, mirrors `NEW_TX_CLEANUP_WAIT`.
pub const NEW_DATA_ITEM_CLEANUP_WAIT: Duration = Duration::from_secs(2 * 60 * 60);

/// How long a bundle can sit unindexed before it's considered for reprocessing.
pub const BUNDLE_REPROCESS_WAIT: Duration = Duration::from_secs(4 * 60 * 60);

/// Tag names joined last in a tag-filtered query because they carry very
/// low selectivity (most rows share the same value).
pub const LOW_SELECTIVITY_TAG_NAMES: [&str; 2] = ["App-Name", "Content-Type"];

/// Ceiling applied to the `gql` reader pool's auto-sized worker count.
pub const MAX_WORKER_COUNT: usize = 12;

/// Per-worker error budget before the pool supervisor retires and respawns it.
pub const MAX_WORKER_ERRORS: u32 = 100;

/// Busy-timeout applied to every store connection.
pub const STORE_BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// SQLite page size used by every store file.
pub const STORE_PAGE_SIZE: u32 = 4096;

/// Failure rate (0.0-1.0) over `CIRCUIT_BREAKER_WINDOW` that trips a breaker.
pub const CIRCUIT_BREAKER_FAILURE_RATE: f64 = 0.5;

/// Rolling window the breaker computes its failure rate over.
pub const CIRCUIT_BREAKER_WINDOW: Duration = Duration::from_secs(5);

/// How long an open breaker stays open before probing again.
pub const CIRCUIT_BREAKER_OPEN_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum sample count in the window before a failure rate can trip the
/// breaker; guards against one unlucky call opening it outright.
pub const CIRCUIT_BREAKER_MIN_SAMPLES: u32 = 5;

/// Default capacity of the read-through chunk cache, in chunk entries.
pub const CHUNK_CACHE_CAPACITY: usize = 4096;
