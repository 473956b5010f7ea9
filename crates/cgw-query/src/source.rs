//! The four uniform-projection sources (spec §4.4 "Four sources") and the
//! SQL each compiles to.

use crate::cursor_predicate::{self, CursorColumns};
use crate::tags;
use crate::types::{BundledIn, GqlTransactionsArgs};
use cgw_types::encoding::Cursor;
use cgw_types::ids::BARE_TX_DATA_ITEM_ID;
use rusqlite::types::Value;
use rusqlite::Connection;

/// `BARE_TX_DATA_ITEM_ID` inlined as a SQL blob literal. It's a compile-time
/// constant shared by every row of a transaction source, so it's spliced
/// into the SQL text directly rather than bound as a parameter — binding it
/// would mean the same `?` text appears in the projection, the cursor
/// predicate and the `ORDER BY` clause, three separate parameter slots that
/// would all need the identical value threaded through in positional order.
fn bare_tx_data_item_id_literal() -> String {
    format!("x'{}'", hex_encode(BARE_TX_DATA_ITEM_ID.as_bytes()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    StableTx,
    StableItem,
    NewTx,
    NewItem,
}

impl Source {
    pub fn is_new(self) -> bool {
        matches!(self, Source::NewTx | Source::NewItem)
    }

    pub fn is_item(self) -> bool {
        matches!(self, Source::StableItem | Source::NewItem)
    }
}

/// One raw row out of a source query, before it's decorated with its tags
/// and turned into a [`crate::types::GqlTransactionNode`].
#[derive(Debug, Clone)]
pub struct RawRow {
    pub source: Source,
    pub height: Option<i64>,
    pub block_transaction_index: Option<i64>,
    pub data_item_id: Vec<u8>,
    pub indexed_at: i64,
    pub id: Vec<u8>,
    pub anchor: Option<Vec<u8>>,
    pub signature: Option<Vec<u8>>,
    pub target: Option<Vec<u8>>,
    pub reward: Option<String>,
    pub quantity: Option<String>,
    pub data_size: i64,
    pub content_type: Option<String>,
    pub owner_address: Vec<u8>,
    pub public_modulus: Option<Vec<u8>>,
    pub block_indep_hash: Option<Vec<u8>>,
    pub block_timestamp: Option<i64>,
    pub block_previous_block: Option<Vec<u8>>,
    pub parent_id: Option<Vec<u8>>,
}

fn row_to_raw(source: Source, row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        source,
        height: row.get(0)?,
        block_transaction_index: row.get(1)?,
        data_item_id: row.get(2)?,
        indexed_at: row.get(3)?,
        id: row.get(4)?,
        anchor: row.get(5)?,
        signature: row.get(6)?,
        target: row.get(7)?,
        reward: row.get(8)?,
        quantity: row.get(9)?,
        data_size: row.get(10)?,
        content_type: row.get(11)?,
        owner_address: row.get(12)?,
        public_modulus: row.get(13)?,
        block_indep_hash: row.get(14)?,
        block_timestamp: row.get(15)?,
        block_previous_block: row.get(16)?,
        parent_id: row.get(17)?,
    })
}

fn base_select(source: Source) -> (&'static str, &'static str) {
    // (FROM/JOIN clause, base table alias)
    match source {
        Source::StableTx => (
            "FROM stable_transactions t \
             JOIN stable_blocks b ON b.height = t.height \
             LEFT JOIN wallets w ON w.address = t.owner_address",
            "t",
        ),
        Source::StableItem => (
            "FROM bundles.stable_data_items di \
             JOIN stable_blocks b ON b.height = di.height \
             LEFT JOIN bundles.wallets w ON w.address = di.owner_address",
            "di",
        ),
        Source::NewTx => (
            "FROM new_transactions t \
             LEFT JOIN new_block_transactions bt ON bt.transaction_id = t.id \
             LEFT JOIN new_blocks b ON b.height = t.height \
             LEFT JOIN wallets w ON w.address = t.owner_address",
            "t",
        ),
        Source::NewItem => (
            "FROM bundles.new_data_items di \
             LEFT JOIN new_blocks b ON b.height = di.height \
             LEFT JOIN bundles.wallets w ON w.address = di.owner_address",
            "di",
        ),
    }
}

fn projection(source: Source) -> String {
    let bare = bare_tx_data_item_id_literal();
    match source {
        Source::StableTx => format!(
            "t.height AS height, t.block_transaction_index AS block_transaction_index, \
             {bare} AS data_item_id, t.indexed_at AS indexed_at, t.id AS id, \
             t.last_tx AS anchor, t.signature AS signature, t.target AS target, \
             t.reward AS reward, t.quantity AS quantity, t.data_size AS data_size, \
             t.content_type AS content_type, t.owner_address AS owner_address, \
             w.public_modulus AS public_modulus, b.indep_hash AS block_indep_hash, \
             b.block_timestamp AS block_timestamp, b.previous_block AS block_previous_block, \
             NULL AS parent_id"
        ),
        Source::StableItem => format!(
            "di.height AS height, di.block_transaction_index AS block_transaction_index, \
             di.id AS data_item_id, di.indexed_at AS indexed_at, di.id AS id, \
             di.anchor AS anchor, di.signature AS signature, di.target AS target, \
             NULL AS reward, NULL AS quantity, di.data_size AS data_size, \
             di.content_type AS content_type, di.owner_address AS owner_address, \
             w.public_modulus AS public_modulus, b.indep_hash AS block_indep_hash, \
             b.block_timestamp AS block_timestamp, b.previous_block AS block_previous_block, \
             di.parent_id AS parent_id"
        ),
        Source::NewTx => format!(
            "t.height AS height, bt.block_transaction_index AS block_transaction_index, \
             {bare} AS data_item_id, t.indexed_at AS indexed_at, t.id AS id, \
             t.last_tx AS anchor, t.signature AS signature, t.target AS target, \
             t.reward AS reward, t.quantity AS quantity, t.data_size AS data_size, \
             t.content_type AS content_type, t.owner_address AS owner_address, \
             w.public_modulus AS public_modulus, b.indep_hash AS block_indep_hash, \
             b.block_timestamp AS block_timestamp, b.previous_block AS block_previous_block, \
             NULL AS parent_id"
        ),
        Source::NewItem => format!(
            "di.height AS height, NULL AS block_transaction_index, \
             di.id AS data_item_id, di.indexed_at AS indexed_at, di.id AS id, \
             di.anchor AS anchor, di.signature AS signature, di.target AS target, \
             NULL AS reward, NULL AS quantity, di.data_size AS data_size, \
             di.content_type AS content_type, di.owner_address AS owner_address, \
             w.public_modulus AS public_modulus, b.indep_hash AS block_indep_hash, \
             b.block_timestamp AS block_timestamp, b.previous_block AS block_previous_block, \
             di.parent_id AS parent_id"
        ),
    }
}

/// Builds and runs the `SELECT ... LIMIT limit` query for one source,
/// applying every filter in [`GqlTransactionsArgs`] plus the cursor
/// continuation predicate and height bound overrides. Mirrors spec §4.4's
/// per-source SELECT construction.
#[allow(clippy::too_many_arguments)]
pub fn query_source(
    conn: &Connection,
    source: Source,
    args: &GqlTransactionsArgs,
    cursor: Option<&Cursor>,
    min_height_override: Option<u64>,
    max_height_override: Option<u64>,
    limit: u32,
) -> Result<Vec<RawRow>, crate::error::QueryError> {
    let ascending = args.sort_order.is_ascending();
    let (from_clause, alias) = base_select(source);
    let is_item = source.is_item();

    let mut where_clauses: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(ids) = &args.ids {
        let placeholders = vec!["?"; ids.len()].join(",");
        where_clauses.push(format!("{alias}.id IN ({placeholders})"));
        params.extend(ids.iter().map(|id| Value::Blob(id.as_bytes().to_vec())));
    }
    if let Some(recipients) = &args.recipients {
        let placeholders = vec!["?"; recipients.len()].join(",");
        where_clauses.push(format!("{alias}.target IN ({placeholders})"));
        params.extend(recipients.iter().map(|a| Value::Blob(a.as_bytes().to_vec())));
    }
    if let Some(owners) = &args.owners {
        let placeholders = vec!["?"; owners.len()].join(",");
        where_clauses.push(format!("{alias}.owner_address IN ({placeholders})"));
        params.extend(owners.iter().map(|a| Value::Blob(a.as_bytes().to_vec())));
    }
    if is_item {
        if let BundledIn::Ids(ids) = &args.bundled_in {
            let placeholders = vec!["?"; ids.len()].join(",");
            where_clauses.push(format!("{alias}.parent_id IN ({placeholders})"));
            params.extend(ids.iter().map(|id| Value::Blob(id.as_bytes().to_vec())));
        }
    }

    let min_height = min_height_override.or(args.min_height);
    let max_height = max_height_override.or(args.max_height);
    if let Some(min_height) = min_height {
        where_clauses.push(format!("{alias}.height >= ?"));
        params.push(Value::Integer(min_height as i64));
    }
    if let Some(max_height) = max_height {
        where_clauses.push(format!("{alias}.height <= ?"));
        params.push(Value::Integer(max_height as i64));
    }

    let (tag_joins, tag_params) = tags::build_tag_joins(source, alias, &args.tags, args.tag_mode);
    params.extend(tag_params);

    let cols = cursor_columns(source, alias);
    if let Some(cursor) = cursor {
        if let Some((sql, cursor_params)) =
            cursor_predicate::build_predicate(cursor, ascending, source.is_new(), &cols)?
        {
            where_clauses.push(sql);
            params.extend(cursor_params);
        }
    }

    let where_sql = if where_clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", where_clauses.join(" AND "))
    };
    let order_sql = cursor_predicate::order_by_clause(ascending, &cols);

    let sql = format!(
        "SELECT {projection} {from_clause}{tag_joins} {where_sql} {order_sql} LIMIT ?",
        projection = projection(source),
    );
    params.push(Value::Integer(limit as i64));

    tracing::debug!(source = ?source, "running gql source query");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), |row| row_to_raw(source, row))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn cursor_columns(source: Source, alias: &str) -> CursorColumns {
    let data_item_id = if source.is_item() {
        format!("{alias}.id")
    } else {
        bare_tx_data_item_id_literal()
    };
    CursorColumns {
        height: format!("{alias}.height"),
        block_transaction_index: if matches!(source, Source::NewItem) {
            "NULL".to_string()
        } else if source.is_item() {
            format!("{alias}.block_transaction_index")
        } else if matches!(source, Source::NewTx) {
            "bt.block_transaction_index".to_string()
        } else {
            format!("{alias}.block_transaction_index")
        },
        data_item_id,
        indexed_at: format!("{alias}.indexed_at"),
        id: format!("{alias}.id"),
    }
}
