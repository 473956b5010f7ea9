//! Store connection setup: WAL journaling, 4 KiB pages, a 30s busy timeout,
//! schema application, and the `core`⟷`bundles` cross-attach. See spec
//! §4.1 and §6 "Store layout".

use crate::error::StoreError;
use crate::schema;
use cgw_types::constants::{STORE_BUSY_TIMEOUT, STORE_PAGE_SIZE};
use rusqlite::Connection;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Core,
    Bundles,
    Data,
    Moderation,
}

/// Paths to the four store files, supplied at construction per spec §6.
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub core: std::path::PathBuf,
    pub bundles: std::path::PathBuf,
    pub data: std::path::PathBuf,
    pub moderation: std::path::PathBuf,
}

fn apply_pragmas(conn: &Connection) -> Result<(), StoreError> {
    // `page_size` must be set before the database takes its first page
    // (journal_mode=WAL writes one immediately); SQLite silently ignores a
    // page_size change after that point without an explicit VACUUM.
    conn.pragma_update(None, "page_size", STORE_PAGE_SIZE)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.busy_timeout(STORE_BUSY_TIMEOUT)?;
    conn.pragma_update(None, "foreign_keys", "OFF")?;
    Ok(())
}

/// Opens a single store file, applies its schema, and (for `core`/
/// `bundles`) attaches the other so planner SQL can join across them.
pub fn open_store(kind: StoreKind, paths: &StorePaths) -> Result<Connection, StoreError> {
    let path = match kind {
        StoreKind::Core => &paths.core,
        StoreKind::Bundles => &paths.bundles,
        StoreKind::Data => &paths.data,
        StoreKind::Moderation => &paths.moderation,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::Transient(e.to_string()))?;
    }
    let conn = Connection::open(path)?;
    apply_pragmas(&conn)?;

    let schema_sql = match kind {
        StoreKind::Core => schema::CORE_SCHEMA,
        StoreKind::Bundles => schema::BUNDLES_SCHEMA,
        StoreKind::Data => schema::DATA_SCHEMA,
        StoreKind::Moderation => schema::MODERATION_SCHEMA,
    };
    conn.execute_batch(schema_sql)?;

    match kind {
        StoreKind::Core => attach(&conn, "bundles", &paths.bundles)?,
        StoreKind::Bundles => attach(&conn, "core", &paths.core)?,
        StoreKind::Data | StoreKind::Moderation => {}
    }

    // Statements are reused heavily (ingestion runs the same handful of
    // inserts thousands of times); widen rusqlite's cache beyond its
    // small default so none of the named statements in `statements.rs`
    // evict each other.
    conn.set_prepared_statement_cache_capacity(64);

    Ok(conn)
}

fn attach(conn: &Connection, schema_name: &str, path: &Path) -> Result<(), StoreError> {
    let path_str = path.to_string_lossy();
    conn.execute_batch(&format!(
        "ATTACH DATABASE '{path}' AS {schema_name};",
        path = path_str,
        schema_name = schema_name
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn opens_and_attaches_core_and_bundles() {
        let dir = tempdir().unwrap();
        let paths = StorePaths {
            core: dir.path().join("core.db"),
            bundles: dir.path().join("bundles.db"),
            data: dir.path().join("data.db"),
            moderation: dir.path().join("moderation.db"),
        };
        let core = open_store(StoreKind::Core, &paths).unwrap();
        // Cross-schema reference must resolve now that bundles is attached.
        core.execute("SELECT COUNT(*) FROM bundles.stable_data_items", [])
            .unwrap();

        let journal_mode: String = core
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(journal_mode.to_lowercase(), "wal");
    }
}
