//! Converts a [`RawRow`] into the public [`GqlTransactionNode`], including
//! the lazy per-row tag fetch (spec §4.4 "Tag decoding").

use crate::error::QueryError;
use crate::source::{RawRow, Source};
use crate::types::{GqlBlockRef, GqlTransactionNode};
use cgw_types::encoding::{b64url_encode, Cursor};
use cgw_types::entities::Tag;
use cgw_types::ids::{BlockId, DataItemId, WalletAddress};
use rusqlite::{params, Connection};

fn tag_sql(source: Source) -> (&'static str, &'static str) {
    match source {
        Source::StableTx => (
            "SELECT tn.name, tv.value FROM stable_transaction_tags stt \
             JOIN tag_names tn ON tn.hash = stt.tag_name_hash \
             JOIN tag_values tv ON tv.hash = stt.tag_value_hash \
             WHERE stt.transaction_id = ?1 ORDER BY stt.tag_index",
            "core",
        ),
        Source::NewTx => (
            "SELECT tn.name, tv.value FROM new_transaction_tags ntt \
             JOIN tag_names tn ON tn.hash = ntt.tag_name_hash \
             JOIN tag_values tv ON tv.hash = ntt.tag_value_hash \
             WHERE ntt.transaction_id = ?1 ORDER BY ntt.tag_index",
            "core",
        ),
        Source::StableItem => (
            "SELECT tn.name, tv.value FROM bundles.stable_data_item_tags sdt \
             JOIN bundles.tag_names tn ON tn.hash = sdt.tag_name_hash \
             JOIN bundles.tag_values tv ON tv.hash = sdt.tag_value_hash \
             WHERE sdt.data_item_id = ?1 ORDER BY sdt.tag_index",
            "bundles",
        ),
        Source::NewItem => (
            "SELECT tn.name, tv.value FROM bundles.new_data_item_tags ndt \
             JOIN bundles.tag_names tn ON tn.hash = ndt.tag_name_hash \
             JOIN bundles.tag_values tv ON tv.hash = ndt.tag_value_hash \
             WHERE ndt.data_item_id = ?1 ORDER BY ndt.tag_index",
            "bundles",
        ),
    }
}

/// Fetches a row's tags by its owner id, selecting the right `*Tags` table
/// "by `data_item_id` length" per spec §4.4 — here, by the source the row
/// came from, which is equivalent and avoids re-deriving it from the id.
fn load_tags(conn: &Connection, row: &RawRow) -> Result<Vec<Tag>, QueryError> {
    let (sql, _schema) = tag_sql(row.source);
    let id = if row.source.is_item() {
        row.data_item_id.clone()
    } else {
        row.id.clone()
    };
    let mut stmt = conn.prepare_cached(sql)?;
    let tags = stmt
        .query_map(params![id], |r| {
            Ok(Tag {
                name: r.get(0)?,
                value: r.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}

pub fn build_node(conn: &Connection, row: RawRow) -> Result<GqlTransactionNode, QueryError> {
    let tags = load_tags(conn, &row)?;

    let id_b64 = b64url_encode(&row.id);
    let data_item_id = DataItemId::try_from(row.data_item_id.as_slice())
        .unwrap_or(cgw_types::ids::BARE_TX_DATA_ITEM_ID);
    let owner_address = WalletAddress::try_from(row.owner_address.as_slice())
        .map(|a| a.to_base64url())
        .unwrap_or_else(|_| b64url_encode(&row.owner_address));

    let block = match (row.block_indep_hash, row.height, row.block_timestamp) {
        (Some(hash), Some(height), Some(timestamp)) => Some(GqlBlockRef {
            indep_hash: BlockId::try_from(hash.as_slice()).unwrap_or(BlockId::zero()),
            timestamp,
            previous_block: row
                .block_previous_block
                .and_then(|b| BlockId::try_from(b.as_slice()).ok()),
            height: height as u64,
        }),
        _ => None,
    };

    Ok(GqlTransactionNode {
        id: id_b64,
        data_item_id,
        parent_id: row.parent_id.map(|p| b64url_encode(&p)),
        anchor: row.anchor.unwrap_or_default(),
        signature: row.signature.unwrap_or_default(),
        target: row.target.map(|t| b64url_encode(&t)),
        quantity: row.quantity,
        reward: row.reward,
        data_size: row.data_size.to_string(),
        content_type: row.content_type,
        owner_address,
        public_modulus: row.public_modulus,
        block,
        height: row.height.map(|h| h as u64),
        block_transaction_index: row.block_transaction_index.map(|b| b as u32),
        indexed_at: row.indexed_at,
        tags,
    })
}

/// Re-derives the continuation cursor for a row, per spec §4.4 "Cursor":
/// `[height, blockTransactionIndex, dataItemId, indexedAt, id]`.
pub fn cursor_for_row(row: &RawRow) -> Cursor {
    Cursor {
        height: row.height.map(|h| h as u64),
        block_transaction_index: row.block_transaction_index.map(|b| b as u32),
        data_item_id: DataItemId::try_from(row.data_item_id.as_slice()).unwrap_or(cgw_types::ids::BARE_TX_DATA_ITEM_ID),
        indexed_at: row.indexed_at,
        id: b64url_encode(&row.id),
    }
}
