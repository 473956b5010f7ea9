//! `BundleIndex` operations against the `bundles` store. Root-transaction
//! height lookups ride the `bundles`→`core` attach set up at open, the same
//! way `core_store` rides the reverse attach for data-item height
//! propagation. See spec §4.2, §6.

use crate::error::StoreError;
use crate::statements::bundles as sql;
use cgw_types::entities::{BundleRecord, DataItem, Tag};
use cgw_types::ids::TxId;
use dashmap::DashMap;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

/// In-memory hot cache over the `filters`/`bundle_formats` dimension tables,
/// per spec §5.2 ("`insertOrIgnoreFilter` + `selectFilterId` with an
/// in-memory hot cache"). Shared across calls against the same store.
#[derive(Debug, Default)]
pub struct DimensionCache {
    filters: DashMap<String, i64>,
    formats: DashMap<String, i64>,
}

impl DimensionCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn filter_id(&self, conn: &Connection, filter: &str) -> Result<i64, StoreError> {
        if let Some(id) = self.filters.get(filter) {
            return Ok(*id);
        }
        conn.prepare_cached(sql::INSERT_OR_IGNORE_FILTER)?
            .execute(params![filter])?;
        let id: i64 = conn
            .prepare_cached(sql::SELECT_FILTER_ID)?
            .query_row(params![filter], |row| row.get(0))?;
        self.filters.insert(filter.to_string(), id);
        Ok(id)
    }

    fn format_id(&self, conn: &Connection, format: &str) -> Result<i64, StoreError> {
        if let Some(id) = self.formats.get(format) {
            return Ok(*id);
        }
        conn.prepare_cached(sql::INSERT_OR_IGNORE_BUNDLE_FORMAT)?
            .execute(params![format])?;
        let id: i64 = conn
            .prepare_cached(sql::SELECT_BUNDLE_FORMAT_ID)?
            .query_row(params![format], |row| row.get(0))?;
        self.formats.insert(format.to_string(), id);
        Ok(id)
    }
}

/// `saveDataItem(item)` — spec §4.2: root-tx height is resolved via the
/// `core` attach rather than requiring the caller to pass it in.
pub fn save_data_item(
    conn: &mut Connection,
    cache: &DimensionCache,
    item: &DataItem,
    tags: &[Tag],
) -> Result<(), StoreError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let root_height: Option<i64> = tx
        .prepare_cached(sql::SELECT_ROOT_TX_HEIGHT)?
        .query_row(params![item.root_tx_id.as_bytes().as_slice()], |row| row.get(0))
        .optional()?
        .flatten();
    let height = item.height.map(|h| h as i64).or(root_height);

    let filter_id = match &item.filter {
        Some(f) => Some(cache.filter_id(&tx, f)?),
        None => None,
    };

    tx.prepare_cached(sql::INSERT_OR_IGNORE_WALLET)?
        .execute(params![item.owner_address.as_bytes().as_slice(), None::<Vec<u8>>])?;

    tx.prepare_cached(sql::UPSERT_NEW_DATA_ITEM)?.execute(params![
        item.id.as_bytes().as_slice(),
        item.parent_id.as_bytes().as_slice(),
        item.root_tx_id.as_bytes().as_slice(),
        item.owner_address.as_bytes().as_slice(),
        item.anchor,
        item.signature,
        item.target.map(|a| a.as_bytes().to_vec()),
        item.data_offset as i64,
        item.data_size as i64,
        item.tag_count,
        item.content_type,
        height,
        item.indexed_at,
        filter_id,
    ])?;

    for (idx, tag) in tags.iter().enumerate() {
        let name_hash = tag.name_hash();
        let value_hash = tag.value_hash();
        tx.prepare_cached(sql::INSERT_OR_IGNORE_TAG_NAME)?
            .execute(params![name_hash.as_bytes().as_slice(), tag.name])?;
        tx.prepare_cached(sql::INSERT_OR_IGNORE_TAG_VALUE)?
            .execute(params![value_hash.as_bytes().as_slice(), tag.value])?;
        tx.prepare_cached(sql::UPSERT_NEW_DATA_ITEM_TAG)?.execute(params![
            name_hash.as_bytes().as_slice(),
            value_hash.as_bytes().as_slice(),
            item.id.as_bytes().as_slice(),
            item.owner_address.as_bytes().as_slice(),
            idx as i64,
            item.indexed_at,
            height,
        ])?;
    }

    tx.commit()?;
    Ok(())
}

/// `saveBundle(record)` — spec §4.2/§5.2: upserts by id, resolving format
/// and filter ids through `cache`.
pub fn save_bundle(conn: &Connection, cache: &DimensionCache, record: &BundleRecord) -> Result<(), StoreError> {
    let format_id = cache.format_id(conn, &record.format)?;
    let unbundle_filter_id = record
        .unbundle_filter
        .as_deref()
        .map(|f| cache.filter_id(conn, f))
        .transpose()?;
    let index_filter_id = record
        .index_filter
        .as_deref()
        .map(|f| cache.filter_id(conn, f))
        .transpose()?;

    conn.prepare_cached(sql::UPSERT_BUNDLE_RECORD)?.execute(params![
        record.id.as_bytes().as_slice(),
        record.root_tx_id.as_bytes().as_slice(),
        format_id,
        unbundle_filter_id,
        index_filter_id,
        record.data_item_count,
        record.matched_data_item_count,
        record.queued_at,
        record.skipped_at,
        record.unbundled_at,
        record.fully_indexed_at,
    ])?;
    Ok(())
}

/// `getFailedBundleIds` — bundles unbundled but never fully indexed and not
/// explicitly skipped.
pub fn get_failed_bundle_ids(conn: &Connection) -> Result<Vec<TxId>, StoreError> {
    let mut stmt = conn.prepare_cached(sql::SELECT_FAILED_BUNDLE_IDS)?;
    let ids = stmt
        .query_map([], |row| row.get::<_, Vec<u8>>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    ids.into_iter()
        .map(|b| TxId::try_from(b.as_slice()).map_err(StoreError::from))
        .collect()
}

/// `backfillBundles(now)` — bundle ids queued for over `BUNDLE_REPROCESS_WAIT`
/// without having finished indexing, eligible for a retry pass.
pub fn backfill_bundles(conn: &Connection, now: i64) -> Result<Vec<TxId>, StoreError> {
    use cgw_types::constants::BUNDLE_REPROCESS_WAIT;
    let cutoff = now - BUNDLE_REPROCESS_WAIT.as_secs() as i64;
    let mut stmt = conn.prepare_cached(sql::SELECT_STALE_BUNDLE_IDS)?;
    let ids = stmt
        .query_map(params![cutoff], |row| row.get::<_, Vec<u8>>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    ids.into_iter()
        .map(|b| TxId::try_from(b.as_slice()).map_err(StoreError::from))
        .collect()
}

/// `updateBundlesFullyIndexedAt(id, timestamp)`. Routed through the write
/// role queue by the caller (spec §9 Open Question resolution); this
/// function is just the statement.
pub fn update_bundles_fully_indexed_at(conn: &Connection, id: TxId, timestamp: i64) -> Result<(), StoreError> {
    conn.prepare_cached(sql::UPDATE_BUNDLE_FULLY_INDEXED_AT)?
        .execute(params![id.as_bytes().as_slice(), timestamp])?;
    Ok(())
}

/// `updateBundlesForFilterChange(id, unbundleFilter, indexFilter)`: re-points
/// a bundle at new filter dimension rows and clears `fully_indexed_at` so the
/// next sweep re-evaluates it against the new filter, since a filter change
/// invalidates any prior match count.
pub fn update_bundles_for_filter_change(
    conn: &Connection,
    cache: &DimensionCache,
    id: TxId,
    unbundle_filter: Option<&str>,
    index_filter: Option<&str>,
) -> Result<(), StoreError> {
    let unbundle_filter_id = unbundle_filter.map(|f| cache.filter_id(conn, f)).transpose()?;
    let index_filter_id = index_filter.map(|f| cache.filter_id(conn, f)).transpose()?;
    conn.prepare_cached(sql::UPDATE_BUNDLE_FOR_FILTER_CHANGE)?
        .execute(params![id.as_bytes().as_slice(), unbundle_filter_id, index_filter_id])?;
    Ok(())
}

/// The `bundles` half of `resetToHeight`, mirroring
/// [`crate::core_store::reset_to_height`]. `new_data_items` heights above
/// `h` revert to `NULL` so the next root-tx confirmation re-propagates them.
pub fn reset_to_height(conn: &Connection, height: u64) -> Result<(), StoreError> {
    conn.prepare_cached(crate::statements::bundles::RESET_CLEAR_NEW_DATA_ITEM_HEIGHTS_ABOVE)?
        .execute(params![height as i64])?;
    Ok(())
}
