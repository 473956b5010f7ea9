//! `get_debug_info` — spec §4.7/§5.8: aggregates invariant checks across the
//! stores into a report. Nothing here panics; violations are collected, not
//! thrown, per the `invariant-violation` taxonomy entry in spec §7.

use crate::error::StoreError;
use crate::statements::{bundles as bundles_sql, core as core_sql};
use cgw_types::constants::BUNDLE_REPROCESS_WAIT;
use rusqlite::Connection;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DebugInfo {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Aggregates the invariant checks of spec §4.7 across `core` and `bundles`.
/// `now` is the caller's current timestamp, used for the bundle-staleness
/// warning; passed in rather than read from the system clock so the check
/// is reproducible in tests.
pub fn get_debug_info(core: &Connection, bundles: &Connection, now: i64) -> Result<DebugInfo, StoreError> {
    let mut info = DebugInfo::default();

    check_stable_block_range_is_gapless(core, &mut info)?;
    check_stable_tx_count_matches_block_transactions(core, &mut info)?;
    check_stale_unindexed_bundles(bundles, now, &mut info)?;

    Ok(info)
}

fn check_stable_block_range_is_gapless(core: &Connection, info: &mut DebugInfo) -> Result<(), StoreError> {
    let count: i64 = core.query_row(core_sql::SELECT_STABLE_BLOCK_COUNT, [], |row| row.get(0))?;
    if count == 0 {
        return Ok(());
    }
    let (min, max): (i64, i64) = core.query_row(core_sql::SELECT_STABLE_BLOCK_HEIGHT_RANGE, [], |row| {
        Ok((row.get(0)?, row.get(1)?))
    })?;
    let expected = max - min + 1;
    if count != expected {
        info.errors.push(format!(
            "stable_blocks has a gap: {count} rows span height {min}..={max} (expected {expected})"
        ));
    }
    Ok(())
}

fn check_stable_tx_count_matches_block_transactions(core: &Connection, info: &mut DebugInfo) -> Result<(), StoreError> {
    let tx_count: i64 = core.query_row(core_sql::SELECT_STABLE_TX_COUNT, [], |row| row.get(0))?;
    let block_tx_count: i64 = core.query_row(core_sql::SELECT_STABLE_BLOCK_TX_COUNT, [], |row| row.get(0))?;
    if tx_count != block_tx_count {
        let mut stmt = core.prepare(core_sql::SELECT_STABLE_TX_IDS_NOT_IN_BLOCK_TRANSACTIONS)?;
        let orphans: i64 = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?.count() as i64;
        info.errors.push(format!(
            "stable_transactions ({tx_count}) and stable_block_transactions ({block_tx_count}) disagree; \
             {orphans} stable tx row(s) have no owning block_transactions row"
        ));
    }
    Ok(())
}

fn check_stale_unindexed_bundles(bundles: &Connection, now: i64, info: &mut DebugInfo) -> Result<(), StoreError> {
    let cutoff = now - BUNDLE_REPROCESS_WAIT.as_secs() as i64;
    let mut stmt = bundles.prepare(bundles_sql::SELECT_STALE_BUNDLE_IDS)?;
    let stale = stmt.query_map([cutoff], |row| row.get::<_, Vec<u8>>(0))?.count();
    if stale > 0 {
        info.warnings.push(format!(
            "{stale} bundle(s) queued over {:?} ago are still not fully indexed",
            BUNDLE_REPROCESS_WAIT
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundles_store::{save_bundle, DimensionCache};
    use crate::core_store::{save_block_and_txs, IncomingTransaction};
    use crate::open::{open_store, StoreKind, StorePaths};
    use cgw_types::entities::{Block, BundleRecord, Transaction};
    use cgw_types::ids::{BlockId, TxId, WalletAddress};
    use tempfile::tempdir;

    fn paths() -> (tempfile::TempDir, StorePaths) {
        let dir = tempdir().unwrap();
        let paths = StorePaths {
            core: dir.path().join("core.db"),
            bundles: dir.path().join("bundles.db"),
            data: dir.path().join("data.db"),
            moderation: dir.path().join("moderation.db"),
        };
        (dir, paths)
    }

    #[test]
    fn clean_stores_report_no_errors_or_warnings() {
        let (_dir, paths) = paths();
        let core = open_store(StoreKind::Core, &paths).unwrap();
        let bundles = open_store(StoreKind::Bundles, &paths).unwrap();

        let info = get_debug_info(&core, &bundles, 1_700_000_000).unwrap();
        assert!(info.errors.is_empty());
        assert!(info.warnings.is_empty());
    }

    #[test]
    fn stale_unindexed_bundle_is_reported_as_a_warning() {
        let (_dir, paths) = paths();
        let core = open_store(StoreKind::Core, &paths).unwrap();
        let bundles = open_store(StoreKind::Bundles, &paths).unwrap();
        let cache = DimensionCache::new();

        let id = TxId::try_from(vec![1u8; 32].as_slice()).unwrap();
        save_bundle(
            &bundles,
            &cache,
            &BundleRecord {
                id,
                root_tx_id: id,
                format: "ans-104".into(),
                unbundle_filter: None,
                index_filter: None,
                data_item_count: None,
                matched_data_item_count: None,
                queued_at: Some(1_000),
                skipped_at: None,
                unbundled_at: None,
                fully_indexed_at: None,
            },
        )
        .unwrap();

        let now = 1_000 + BUNDLE_REPROCESS_WAIT.as_secs() as i64 + 1;
        let info = get_debug_info(&core, &bundles, now).unwrap();
        assert!(info.errors.is_empty());
        assert_eq!(info.warnings.len(), 1);
    }

    #[test]
    fn gapless_stable_blocks_after_promotion_pass_the_check() {
        let (_dir, paths) = paths();
        let mut core = open_store(StoreKind::Core, &paths).unwrap();
        let bundles = open_store(StoreKind::Bundles, &paths).unwrap();

        for h in 0..=55u64 {
            let incoming = IncomingTransaction {
                transaction: Transaction {
                    id: TxId::try_from(vec![h as u8; 32].as_slice()).unwrap(),
                    signature: vec![],
                    format: 2,
                    last_tx: None,
                    owner_address: WalletAddress::try_from(vec![9u8; 32].as_slice()).unwrap(),
                    target: None,
                    quantity: "0".into(),
                    reward: "0".into(),
                    data_size: 0,
                    data_root: None,
                    tag_count: 0,
                    content_type: None,
                    created_at: 1_700_000_000,
                    indexed_at: 1_700_000_000,
                    height: Some(h),
                },
                tags: vec![],
            };
            save_block_and_txs(
                &mut core,
                &Block {
                    height: h,
                    indep_hash: BlockId::try_from(vec![h as u8; 32].as_slice()).unwrap(),
                    previous_block: None,
                    nonce: vec![],
                    mining_hash: vec![],
                    timestamp: 1_700_000_000 + h as i64,
                    difficulty: "1".into(),
                    cumulative_difficulty: "1".into(),
                    last_retarget: 0,
                    reward_address: None,
                    reward_pool: "0".into(),
                    block_size: 0,
                    weave_size: 0,
                    usd_to_token_rate: (1, 1),
                    scheduled_usd_to_token_rate: (1, 1),
                    hash_list_merkle: None,
                    wallet_list_hash: vec![],
                    tx_root: None,
                    tx_count: 1,
                    missing_tx_count: 0,
                },
                &[incoming],
                &[],
            )
            .unwrap();
        }
        crate::staging::promote_core(&mut core, 55).unwrap();

        let info = get_debug_info(&core, &bundles, 1_700_000_000).unwrap();
        assert!(info.errors.is_empty(), "unexpected errors: {:?}", info.errors);
    }
}
