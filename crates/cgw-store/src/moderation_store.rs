//! `moderation` store operations (spec §5.7). This store is never attached
//! to `core`/`bundles` — nothing in the query planner joins across it, so
//! blocking is checked by the caller as a separate, independent step.

use crate::error::StoreError;
use crate::statements::moderation as sql;
use cgw_types::ids::ContentHash;
use rusqlite::{params, Connection, OptionalExtension};

/// `isIdBlocked(id)`. Accepts the raw id bytes since this store blocks by
/// any of the id kinds (tx id, data item id) uniformly.
pub fn is_id_blocked(conn: &Connection, id: &[u8]) -> Result<bool, StoreError> {
    Ok(conn
        .prepare_cached(sql::SELECT_ID_BLOCKED)?
        .query_row(params![id], |row| row.get::<_, i64>(0))
        .optional()?
        .is_some())
}

/// `isHashBlocked(hash)`.
pub fn is_hash_blocked(conn: &Connection, hash: ContentHash) -> Result<bool, StoreError> {
    Ok(conn
        .prepare_cached(sql::SELECT_HASH_BLOCKED)?
        .query_row(params![hash.as_bytes().as_slice()], |row| row.get::<_, i64>(0))
        .optional()?
        .is_some())
}

fn source_id(conn: &Connection, source: &str) -> Result<i64, StoreError> {
    conn.prepare_cached(sql::INSERT_OR_IGNORE_BLOCK_SOURCE)?
        .execute(params![source])?;
    Ok(conn
        .prepare_cached(sql::SELECT_BLOCK_SOURCE_ID)?
        .query_row(params![source], |row| row.get(0))?)
}

/// `blockData(id, hash, source, notes)` — either or both of `id`/`hash` may
/// be supplied; at least one must be, since blocking neither blocks nothing.
/// `source` is itself optional: when omitted, the blocked row carries no
/// audit source id rather than being rejected.
pub fn block_data(
    conn: &Connection,
    id: Option<&[u8]>,
    hash: Option<ContentHash>,
    source: Option<&str>,
    notes: Option<&str>,
) -> Result<(), StoreError> {
    let src_id = source.map(|s| source_id(conn, s)).transpose()?;
    if let Some(id) = id {
        conn.prepare_cached(sql::INSERT_OR_IGNORE_BLOCKED_ID)?
            .execute(params![id, src_id, notes])?;
    }
    if let Some(hash) = hash {
        conn.prepare_cached(sql::INSERT_OR_IGNORE_BLOCKED_HASH)?
            .execute(params![hash.as_bytes().as_slice(), src_id, notes])?;
    }
    Ok(())
}
