//! `data` store operations: the content-hash and parent-offset index (spec
//! §3 "Data-index entities", §6 `ContiguousDataIndex`/`NestedDataIndexWriter`).
//! Reads here are raw; the circuit-breaker wrapping around
//! `get_data_attributes`/`get_data_parent` lives in `cgw-stream` and
//! `cgw-gateway`, not in the store itself.

use crate::error::StoreError;
use crate::statements::data as sql;
use cgw_types::entities::{DataHash, NestedDataParent};
use cgw_types::ids::{ContentHash, DataItemId, DataRoot, TxId};
use rusqlite::{params, Connection, OptionalExtension};

/// `saveDataContentAttributes` — records a resolved content hash and links a
/// tx/data-item id and/or data root to it.
pub fn save_data_content_attributes(
    conn: &Connection,
    hash: &DataHash,
    id: Option<TxId>,
    data_root: Option<DataRoot>,
) -> Result<(), StoreError> {
    conn.prepare_cached(sql::INSERT_OR_IGNORE_DATA_HASH)?.execute(params![
        hash.hash.as_bytes().as_slice(),
        hash.data_size as i64,
        hash.original_source_content_type,
        hash.cached_at,
        hash.indexed_at,
    ])?;
    if let Some(id) = id {
        conn.prepare_cached(sql::INSERT_OR_IGNORE_DATA_ID)?
            .execute(params![id.as_bytes().as_slice(), hash.hash.as_bytes().as_slice()])?;
    }
    if let Some(root) = data_root {
        conn.prepare_cached(sql::INSERT_OR_IGNORE_DATA_ROOT)?
            .execute(params![root.as_bytes().as_slice(), hash.hash.as_bytes().as_slice()])?;
    }
    Ok(())
}

type DataHashRow = (Vec<u8>, i64, Option<String>, Option<i64>, i64);

fn row_to_hash((hash, size, content_type, cached_at, indexed_at): DataHashRow) -> Result<DataHash, StoreError> {
    Ok(DataHash {
        hash: ContentHash::try_from(hash.as_slice())?,
        data_size: size as u64,
        original_source_content_type: content_type,
        cached_at,
        indexed_at,
    })
}

/// Resolves the canonical content hash for a tx/data-item id.
pub fn get_data_attributes_by_id(conn: &Connection, id: TxId) -> Result<Option<DataHash>, StoreError> {
    conn.prepare_cached(sql::SELECT_DATA_ATTRIBUTES_BY_ID)?
        .query_row(params![id.as_bytes().as_slice()], |row| -> rusqlite::Result<DataHashRow> {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        })
        .optional()?
        .map(row_to_hash)
        .transpose()
}

/// Resolves the canonical content hash for a transaction's data root.
pub fn get_data_attributes_by_root(conn: &Connection, root: DataRoot) -> Result<Option<DataHash>, StoreError> {
    conn.prepare_cached(sql::SELECT_DATA_ATTRIBUTES_BY_ROOT)?
        .query_row(params![root.as_bytes().as_slice()], |row| -> rusqlite::Result<DataHashRow> {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        })
        .optional()?
        .map(row_to_hash)
        .transpose()
}

/// `saveNestedDataId` — spec §6 `NestedDataIndexWriter`.
pub fn save_nested_data_id(
    conn: &Connection,
    id: DataItemId,
    parent_id: DataItemId,
    data_offset: u64,
    data_size: Option<u64>,
) -> Result<(), StoreError> {
    conn.prepare_cached(sql::INSERT_OR_IGNORE_NESTED_DATA_ID)?.execute(params![
        id.as_bytes().as_slice(),
        parent_id.as_bytes().as_slice(),
        data_offset as i64,
        data_size.map(|s| s as i64),
    ])?;
    Ok(())
}

/// `saveNestedDataHash` — spec §6 `NestedDataIndexWriter`.
pub fn save_nested_data_hash(
    conn: &Connection,
    hash: ContentHash,
    parent_id: DataItemId,
    data_offset: u64,
) -> Result<(), StoreError> {
    conn.prepare_cached(sql::INSERT_OR_IGNORE_NESTED_DATA_HASH)?.execute(params![
        hash.as_bytes().as_slice(),
        parent_id.as_bytes().as_slice(),
        data_offset as i64,
    ])?;
    Ok(())
}

/// Resolves the enclosing parent and sub-range for a nested data-item id.
pub fn get_data_parent_by_id(conn: &Connection, id: DataItemId) -> Result<Option<NestedDataParent>, StoreError> {
    conn.prepare_cached(sql::SELECT_NESTED_PARENT_BY_ID)?
        .query_row(params![id.as_bytes().as_slice()], |row| {
            Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, i64>(1)?, row.get::<_, Option<i64>>(2)?))
        })
        .optional()?
        .map(|(parent, offset, size)| {
            Ok(NestedDataParent {
                parent_id: DataItemId::try_from(parent.as_slice())?,
                data_offset: offset as u64,
                data_size: size.map(|s| s as u64),
            })
        })
        .transpose()
}

/// Resolves the enclosing parent and sub-range for a nested content hash.
pub fn get_data_parent_by_hash(conn: &Connection, hash: ContentHash) -> Result<Option<NestedDataParent>, StoreError> {
    conn.prepare_cached(sql::SELECT_NESTED_PARENT_BY_HASH)?
        .query_row(params![hash.as_bytes().as_slice()], |row| {
            Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, i64>(1)?))
        })
        .optional()?
        .map(|(parent, offset)| {
            Ok(NestedDataParent {
                parent_id: DataItemId::try_from(parent.as_slice())?,
                data_offset: offset as u64,
                data_size: None,
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open::{open_store, StoreKind, StorePaths};
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
    fn resolves_attributes_by_id_and_by_root() {
        let (_dir, paths) = paths();
        let conn = open_store(StoreKind::Data, &paths).unwrap();

        let hash = DataHash {
            hash: ContentHash::try_from(vec![1u8; 32].as_slice()).unwrap(),
            data_size: 100,
            original_source_content_type: Some("image/png".into()),
            cached_at: Some(1_700_000_000),
            indexed_at: 1_700_000_000,
        };
        let id = TxId::try_from(vec![2u8; 32].as_slice()).unwrap();
        let root = DataRoot::try_from(vec![3u8; 32].as_slice()).unwrap();
        save_data_content_attributes(&conn, &hash, Some(id), Some(root)).unwrap();

        let by_id = get_data_attributes_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(by_id.hash, hash.hash);
        assert_eq!(by_id.data_size, 100);

        let by_root = get_data_attributes_by_root(&conn, root).unwrap().unwrap();
        assert_eq!(by_root.hash, hash.hash);
    }

    #[test]
    fn unknown_id_resolves_to_none() {
        let (_dir, paths) = paths();
        let conn = open_store(StoreKind::Data, &paths).unwrap();
        let id = TxId::try_from(vec![9u8; 32].as_slice()).unwrap();
        assert!(get_data_attributes_by_id(&conn, id).unwrap().is_none());
    }

    #[test]
    fn nested_data_id_round_trips_to_parent() {
        let (_dir, paths) = paths();
        let conn = open_store(StoreKind::Data, &paths).unwrap();

        let id = DataItemId::try_from(vec![4u8; 32].as_slice()).unwrap();
        let parent = DataItemId::try_from(vec![5u8; 32].as_slice()).unwrap();
        save_nested_data_id(&conn, id, parent, 128, Some(64)).unwrap();

        let resolved = get_data_parent_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(resolved.parent_id, parent);
        assert_eq!(resolved.data_offset, 128);
        assert_eq!(resolved.data_size, Some(64));
    }
}
