//! `ChainIndex` and `ChainOffsetIndex` operations against the `core` store.
//! Each public function runs inside one `IMMEDIATE` transaction, per spec
//! §4.2 / §5.2; statements come from [`crate::statements::core`].

use crate::error::StoreError;
use crate::statements::core as sql;
use cgw_types::entities::{Block, Tag, Transaction};
use cgw_types::ids::{BlockId, DataRoot, TxId};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

/// A transaction paired with the tags it carries, as supplied to
/// [`save_block_and_txs`]/[`save_tx`]. Ingestion always has both on hand
/// (they arrive together off the chain source), so there is no reason to
/// force callers to re-look-up tags by id.
#[derive(Debug, Clone)]
pub struct IncomingTransaction {
    pub transaction: Transaction,
    pub tags: Vec<Tag>,
}

fn insert_tx(tx: &rusqlite::Transaction<'_>, incoming: &IncomingTransaction) -> Result<(), StoreError> {
    let t = &incoming.transaction;

    tx.prepare_cached(sql::INSERT_OR_IGNORE_WALLET)?.execute(params![
        t.owner_address.as_bytes().as_slice(),
        None::<Vec<u8>>,
    ])?;

    tx.prepare_cached(sql::UPSERT_NEW_TRANSACTION)?.execute(params![
        t.id.as_bytes().as_slice(),
        t.signature,
        t.format,
        t.last_tx.map(|id| id.as_bytes().to_vec()),
        t.owner_address.as_bytes().as_slice(),
        t.target.map(|a| a.as_bytes().to_vec()),
        t.quantity,
        t.reward,
        t.data_size as i64,
        t.data_root.map(|r| r.as_bytes().to_vec()),
        t.tag_count,
        t.content_type,
        t.created_at,
        t.indexed_at,
        t.height.map(|h| h as i64),
    ])?;

    for (idx, tag) in incoming.tags.iter().enumerate() {
        let name_hash = tag.name_hash();
        let value_hash = tag.value_hash();
        tx.prepare_cached(sql::INSERT_OR_IGNORE_TAG_NAME)?
            .execute(params![name_hash.as_bytes().as_slice(), tag.name])?;
        tx.prepare_cached(sql::INSERT_OR_IGNORE_TAG_VALUE)?
            .execute(params![value_hash.as_bytes().as_slice(), tag.value])?;
        tx.prepare_cached(sql::UPSERT_NEW_TRANSACTION_TAG)?.execute(params![
            name_hash.as_bytes().as_slice(),
            value_hash.as_bytes().as_slice(),
            t.id.as_bytes().as_slice(),
            t.owner_address.as_bytes().as_slice(),
            idx as i64,
            t.indexed_at,
            t.height.map(|h| h as i64),
        ])?;
    }

    if let Some(height) = t.height {
        tx.prepare_cached(sql::PROPAGATE_HEIGHT_TO_BUNDLE_DATA_ITEMS)?
            .execute(params![t.id.as_bytes().as_slice(), height as i64])?;
    }

    Ok(())
}

/// `saveBlockAndTxs(block, txs, missingTxIds)` — spec §4.2. Runs entirely
/// against the `core` connection; the block-height propagation onto
/// `bundles.new_data_items` rides the cross-store attach set up at open.
/// Returns `true` once `block.height % STABLE_FLUSH_INTERVAL == 0`, signalling
/// the caller to run the promotion sweep in [`crate::staging`].
pub fn save_block_and_txs(
    conn: &mut Connection,
    block: &Block,
    txs: &[IncomingTransaction],
    missing_tx_ids: &[TxId],
) -> Result<bool, StoreError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.prepare_cached(sql::INSERT_OR_IGNORE_NEW_BLOCK)?.execute(params![
        block.height as i64,
        block.indep_hash.as_bytes().as_slice(),
        block.previous_block.map(|b| b.as_bytes().to_vec()),
        block.nonce,
        block.mining_hash,
        block.timestamp,
        block.difficulty,
        block.cumulative_difficulty,
        block.last_retarget,
        block.reward_address.map(|a| a.as_bytes().to_vec()),
        block.reward_pool,
        block.block_size as i64,
        block.weave_size as i64,
        block.usd_to_token_rate.0 as i64,
        block.usd_to_token_rate.1 as i64,
        block.scheduled_usd_to_token_rate.0 as i64,
        block.scheduled_usd_to_token_rate.1 as i64,
        block.hash_list_merkle,
        block.wallet_list_hash,
        block.tx_root,
        block.tx_count,
        block.missing_tx_count,
    ])?;

    for (idx, incoming) in txs.iter().enumerate() {
        tx.prepare_cached(sql::INSERT_OR_IGNORE_NEW_BLOCK_TRANSACTION)?
            .execute(params![
                block.indep_hash.as_bytes().as_slice(),
                incoming.transaction.id.as_bytes().as_slice(),
                idx as i64,
                block.height as i64,
            ])?;
        insert_tx(&tx, incoming)?;
    }

    for missing_id in missing_tx_ids {
        tx.prepare_cached(sql::INSERT_MISSING_TRANSACTION)?.execute(params![
            missing_id.as_bytes().as_slice(),
            block.indep_hash.as_bytes().as_slice(),
            block.height as i64,
        ])?;
    }

    tx.commit()?;

    Ok(block.height % cgw_types::constants::STABLE_FLUSH_INTERVAL == 0)
}

/// `saveTx(tx)` — spec §4.2: reuses a pending `missing_transactions` height
/// if one was recorded, then inserts/updates the tx and clears the
/// placeholder.
pub fn save_tx(conn: &mut Connection, mut incoming: IncomingTransaction) -> Result<(), StoreError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let pending_height: Option<i64> = tx
        .prepare_cached(sql::SELECT_MISSING_TRANSACTION_HEIGHT)?
        .query_row(params![incoming.transaction.id.as_bytes().as_slice()], |row| row.get(0))
        .optional()?;
    if let Some(height) = pending_height {
        incoming.transaction.height = Some(height as u64);
    }

    insert_tx(&tx, &incoming)?;

    tx.prepare_cached(sql::DELETE_MISSING_TRANSACTION)?
        .execute(params![incoming.transaction.id.as_bytes().as_slice()])?;

    tx.commit()?;
    Ok(())
}

/// `resetToHeight(h)` on the `core` store half of the rollback (spec §4.1,
/// §4.2, invariant 3). The `bundles` half lives in
/// [`crate::bundles_store::reset_to_height`]; the two run as independent
/// transactions since cross-store atomicity is not required here.
pub fn reset_to_height(conn: &mut Connection, height: u64) -> Result<(), StoreError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let h = height as i64;

    tx.prepare_cached(sql::RESET_CLEAR_NEW_TRANSACTION_HEIGHTS_ABOVE)?
        .execute(params![h])?;
    tx.prepare_cached(sql::CLEAR_HEIGHT_ON_NEW_TRANSACTION_TAGS_ABOVE)?
        .execute(params![h])?;
    tx.prepare_cached(sql::RESET_TRUNCATE_NEW_BLOCK_TRANSACTIONS_ABOVE)?
        .execute(params![h])?;
    tx.prepare_cached(sql::RESET_TRUNCATE_NEW_BLOCKS_ABOVE)?
        .execute(params![h])?;
    tx.prepare_cached(sql::RESET_TRUNCATE_MISSING_TRANSACTIONS_ABOVE)?
        .execute(params![h])?;

    tx.commit()?;
    Ok(())
}

pub fn get_max_height(conn: &Connection) -> Result<Option<u64>, StoreError> {
    let height: Option<i64> = conn
        .prepare_cached(sql::SELECT_MAX_HEIGHT)?
        .query_row([], |row| row.get(0))?;
    Ok(height.map(|h| h as u64))
}

pub fn get_block_hash_by_height(conn: &Connection, height: u64) -> Result<Option<BlockId>, StoreError> {
    let bytes: Option<Vec<u8>> = conn
        .prepare_cached(sql::SELECT_BLOCK_HASH_BY_HEIGHT)?
        .query_row(params![height as i64], |row| row.get(0))
        .optional()?;
    bytes
        .map(|b| BlockId::try_from(b.as_slice()).map_err(StoreError::from))
        .transpose()
}

pub fn get_missing_tx_ids(conn: &Connection) -> Result<Vec<TxId>, StoreError> {
    let mut stmt = conn.prepare_cached(sql::SELECT_MISSING_TX_IDS)?;
    let ids = stmt
        .query_map([], |row| row.get::<_, Vec<u8>>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    ids.into_iter()
        .map(|b| TxId::try_from(b.as_slice()).map_err(StoreError::from))
        .collect()
}

/// `getTxIdsMissingOffsets` — spec §6 `ChainOffsetIndex`.
pub fn get_tx_ids_missing_offsets(conn: &Connection) -> Result<Vec<TxId>, StoreError> {
    let mut stmt = conn.prepare_cached(sql::SELECT_TX_IDS_MISSING_OFFSETS)?;
    let ids = stmt
        .query_map([], |row| row.get::<_, Vec<u8>>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    ids.into_iter()
        .map(|b| TxId::try_from(b.as_slice()).map_err(StoreError::from))
        .collect()
}

/// `saveTxOffset(txId, offset, size)` — spec §6 `ChainOffsetIndex`.
pub fn save_tx_offset(conn: &Connection, tx_id: TxId, offset: u64, size: u64) -> Result<(), StoreError> {
    conn.prepare_cached(sql::INSERT_OR_IGNORE_TRANSACTION_OFFSET)?
        .execute(params![tx_id.as_bytes().as_slice(), offset as i64, size as i64])?;
    Ok(())
}

/// Whether `id` (a transaction or data item id) has been promoted past
/// `MAX_FORK_DEPTH`, i.e. is no longer subject to a fork rollback. Backs the
/// `stable` flag `cgw-gateway` attaches to `ContiguousDataIndex::getDataAttributes`.
pub fn is_confirmed_stable(conn: &Connection, id: &[u8]) -> Result<bool, StoreError> {
    Ok(conn
        .prepare_cached(sql::SELECT_IS_CONFIRMED_STABLE)?
        .query_row(params![id], |row| row.get::<_, i64>(0))
        .optional()?
        .is_some())
}

/// Same check for a root-level upload resolved by its data root rather than
/// by id; see [`crate::statements::core::SELECT_IS_CONFIRMED_STABLE_BY_ROOT`]
/// for why bundled data items can't use this path.
pub fn is_confirmed_stable_by_root(conn: &Connection, data_root: &[u8]) -> Result<bool, StoreError> {
    Ok(conn
        .prepare_cached(sql::SELECT_IS_CONFIRMED_STABLE_BY_ROOT)?
        .query_row(params![data_root], |row| row.get::<_, i64>(0))
        .optional()?
        .is_some())
}
