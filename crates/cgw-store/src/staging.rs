//! Stable promotion sweep, run every `STABLE_FLUSH_INTERVAL` blocks per spec
//! §4.1/§4.2: rows below `MAX_FORK_DEPTH` from the tip are copied from their
//! `new_*` family into `stable_*`, then the now-redundant `new_*` rows (and
//! anything simply too old to matter) are deleted.

use crate::error::StoreError;
use crate::statements::{bundles as bundles_sql, core as core_sql};
use cgw_types::constants::{MAX_FORK_DEPTH, NEW_DATA_ITEM_CLEANUP_WAIT, NEW_TX_CLEANUP_WAIT};
use rusqlite::{params, Connection, TransactionBehavior};

/// The result of a core-store promotion sweep, threaded into
/// [`promote_bundles`] so both stores retire stale rows against the same
/// stable-block clock.
#[derive(Debug, Clone, Copy)]
pub struct PromotionCheckpoint {
    pub end_height: u64,
    pub max_stable_block_timestamp: Option<i64>,
}

/// Runs the `core` half of the sweep: promote `new_blocks`/`new_block_transactions`/
/// `new_transactions`/`new_transaction_tags` up to `end_height = tip_height -
/// MAX_FORK_DEPTH`, then delete stale `new_*` rows per spec §4.2.
pub fn promote_core(conn: &mut Connection, tip_height: u64) -> Result<PromotionCheckpoint, StoreError> {
    let end_height = tip_height.saturating_sub(MAX_FORK_DEPTH);
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let h = end_height as i64;

    tx.prepare_cached(core_sql::INSERT_OR_IGNORE_STABLE_BLOCKS)?
        .execute(params![h])?;
    tx.prepare_cached(core_sql::INSERT_OR_IGNORE_STABLE_BLOCK_TRANSACTIONS)?
        .execute(params![h])?;
    tx.prepare_cached(core_sql::INSERT_OR_IGNORE_STABLE_TRANSACTIONS)?
        .execute(params![h])?;
    tx.prepare_cached(core_sql::INSERT_OR_IGNORE_STABLE_TRANSACTION_TAGS)?
        .execute(params![h])?;

    let max_stable_timestamp: Option<i64> = tx
        .prepare_cached(core_sql::SELECT_MAX_STABLE_BLOCK_TIMESTAMP)?
        .query_row([], |row| row.get(0))?;
    let tx_cutoff = max_stable_timestamp
        .map(|ts| ts - NEW_TX_CLEANUP_WAIT.as_secs() as i64)
        .unwrap_or(i64::MIN);

    tx.prepare_cached(core_sql::DELETE_STALE_NEW_TRANSACTIONS)?
        .execute(params![h, tx_cutoff])?;
    tx.prepare_cached(core_sql::DELETE_STALE_NEW_TRANSACTION_TAGS)?
        .execute([])?;
    tx.prepare_cached(core_sql::DELETE_STALE_NEW_BLOCK_TRANSACTIONS)?
        .execute(params![h])?;
    tx.prepare_cached(core_sql::DELETE_STALE_NEW_BLOCKS)?
        .execute(params![h])?;
    tx.prepare_cached(core_sql::DELETE_STALE_MISSING_TRANSACTIONS)?
        .execute(params![h])?;

    tx.commit()?;
    Ok(PromotionCheckpoint {
        end_height,
        max_stable_block_timestamp: max_stable_timestamp,
    })
}

/// Runs the `bundles` half of the sweep, mirroring `promote_core` for
/// `new_data_items`/`new_data_item_tags` against the checkpoint `promote_core`
/// just produced (bundles has no block clock of its own, per spec §4.2).
pub fn promote_bundles(conn: &mut Connection, checkpoint: PromotionCheckpoint) -> Result<(), StoreError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let h = checkpoint.end_height as i64;

    tx.prepare_cached(bundles_sql::INSERT_OR_IGNORE_STABLE_DATA_ITEMS)?
        .execute(params![h])?;
    tx.prepare_cached(bundles_sql::INSERT_OR_IGNORE_STABLE_DATA_ITEM_TAGS)?
        .execute(params![h])?;

    let item_cutoff = checkpoint
        .max_stable_block_timestamp
        .map(|ts| ts - NEW_DATA_ITEM_CLEANUP_WAIT.as_secs() as i64)
        .unwrap_or(i64::MIN);
    tx.prepare_cached(bundles_sql::DELETE_STALE_NEW_DATA_ITEMS)?
        .execute(params![h, item_cutoff])?;
    tx.prepare_cached(bundles_sql::DELETE_STALE_NEW_DATA_ITEM_TAGS)?
        .execute([])?;

    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_store::{get_max_height, save_block_and_txs, IncomingTransaction};
    use crate::open::{open_store, StoreKind, StorePaths};
    use cgw_types::entities::{Block, Tag, Transaction};
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

    fn block(height: u64) -> Block {
        Block {
            height,
            indep_hash: BlockId::try_from(vec![height as u8; 32].as_slice()).unwrap(),
            previous_block: None,
            nonce: vec![],
            mining_hash: vec![],
            timestamp: 1_700_000_000 + height as i64,
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
        }
    }

    fn tx_with_tag(seed: u8, height: u64) -> IncomingTransaction {
        IncomingTransaction {
            transaction: Transaction {
                id: TxId::try_from(vec![seed; 32].as_slice()).unwrap(),
                signature: vec![],
                format: 2,
                last_tx: None,
                owner_address: WalletAddress::try_from(vec![9u8; 32].as_slice()).unwrap(),
                target: None,
                quantity: "0".into(),
                reward: "0".into(),
                data_size: 0,
                data_root: None,
                tag_count: 1,
                content_type: None,
                created_at: 1_700_000_000,
                indexed_at: 1_700_000_000,
                height: Some(height),
            },
            tags: vec![Tag {
                name: b"App-Name".to_vec(),
                value: b"Test".to_vec(),
            }],
        }
    }

    #[test]
    fn promotes_heights_below_fork_depth_and_leaves_recent_ones_in_new() {
        let (_dir, paths) = paths();
        let mut core = open_store(StoreKind::Core, &paths).unwrap();
        let mut bundles = open_store(StoreKind::Bundles, &paths).unwrap();

        for h in 0..=55u64 {
            save_block_and_txs(&mut core, &block(h), &[tx_with_tag(h as u8, h)], &[]).unwrap();
        }
        assert_eq!(get_max_height(&core).unwrap(), Some(55));

        let checkpoint = promote_core(&mut core, 55).unwrap();
        promote_bundles(&mut bundles, checkpoint).unwrap();
        assert_eq!(checkpoint.end_height, 5);

        let stable_max: i64 = core
            .query_row("SELECT MAX(height) FROM stable_blocks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stable_max, 5);

        let stable_count: i64 = core
            .query_row("SELECT COUNT(*) FROM stable_blocks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stable_count, 6); // heights 0..=5

        let still_new: i64 = core
            .query_row(
                "SELECT COUNT(*) FROM new_blocks WHERE height = 55",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(still_new, 1);
    }
}
