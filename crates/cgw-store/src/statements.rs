//! Named SQL fragments, one `const` per domain verb. Ingestion and staging
//! code resolves a verb to its SQL text and hands it to
//! `Connection::prepare_cached`, which does the actual statement-object
//! reuse (see `open::open_store`'s widened cache capacity). Keeping the SQL
//! itself in one place, named by verb, is what spec §4.1 calls "a
//! schema-level repository of SQL fragments".

pub mod core {
    pub const INSERT_OR_IGNORE_NEW_BLOCK: &str = "
        INSERT OR IGNORE INTO new_blocks (
            height, indep_hash, previous_block, nonce, mining_hash, block_timestamp,
            diff, cumulative_diff, last_retarget, reward_address, reward_pool, block_size,
            weave_size, usd_to_token_rate_dividend, usd_to_token_rate_divisor,
            scheduled_usd_to_token_rate_dividend, scheduled_usd_to_token_rate_divisor,
            hash_list_merkle, wallet_list_hash, tx_root, tx_count, missing_tx_count
        ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,?21,?22)";

    pub const INSERT_OR_IGNORE_NEW_BLOCK_TRANSACTION: &str = "
        INSERT OR IGNORE INTO new_block_transactions
            (block_indep_hash, transaction_id, block_transaction_index, height)
        VALUES (?1, ?2, ?3, ?4)";

    pub const INSERT_OR_IGNORE_WALLET: &str =
        "INSERT OR IGNORE INTO wallets (address, public_modulus) VALUES (?1, ?2)";

    pub const INSERT_OR_IGNORE_TAG_NAME: &str =
        "INSERT OR IGNORE INTO tag_names (hash, name) VALUES (?1, ?2)";

    pub const INSERT_OR_IGNORE_TAG_VALUE: &str =
        "INSERT OR IGNORE INTO tag_values (hash, value) VALUES (?1, ?2)";

    pub const UPSERT_NEW_TRANSACTION: &str = "
        INSERT INTO new_transactions (
            id, signature, format, last_tx, owner_address, target, quantity, reward,
            data_size, data_root, tag_count, content_type, created_at, indexed_at, height
        ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15)
        ON CONFLICT(id) DO UPDATE SET
            signature = excluded.signature,
            height = COALESCE(excluded.height, new_transactions.height)";

    pub const UPSERT_NEW_TRANSACTION_TAG: &str = "
        INSERT OR IGNORE INTO new_transaction_tags
            (tag_name_hash, tag_value_hash, transaction_id, owner_address, tag_index, indexed_at, height)
        VALUES (?1,?2,?3,?4,?5,?6,?7)";

    pub const CLEAR_HEIGHT_ON_NEW_TRANSACTION_TAGS_ABOVE: &str =
        "UPDATE new_transaction_tags SET height = NULL WHERE height > ?1";

    pub const SET_HEIGHT_ON_NEW_TRANSACTION: &str =
        "UPDATE new_transactions SET height = ?2 WHERE id = ?1";

    pub const INSERT_MISSING_TRANSACTION: &str = "
        INSERT OR IGNORE INTO missing_transactions (transaction_id, block_indep_hash, height)
        VALUES (?1, ?2, ?3)";

    pub const SELECT_MISSING_TRANSACTION_HEIGHT: &str =
        "SELECT height FROM missing_transactions WHERE transaction_id = ?1";

    pub const DELETE_MISSING_TRANSACTION: &str =
        "DELETE FROM missing_transactions WHERE transaction_id = ?1";

    pub const SELECT_MAX_HEIGHT: &str = "SELECT MAX(height) FROM new_blocks";

    pub const SELECT_BLOCK_HASH_BY_HEIGHT: &str =
        "SELECT indep_hash FROM new_blocks WHERE height = ?1";

    pub const SELECT_MISSING_TX_IDS: &str = "SELECT transaction_id FROM missing_transactions";

    pub const SELECT_MAX_STABLE_BLOCK_HEIGHT: &str = "SELECT MAX(height) FROM stable_blocks";

    pub const SELECT_MAX_STABLE_BLOCK_TIMESTAMP: &str =
        "SELECT MAX(block_timestamp) FROM stable_blocks";

    pub const INSERT_OR_IGNORE_STABLE_BLOCKS: &str = "
        INSERT OR IGNORE INTO stable_blocks
        SELECT * FROM new_blocks WHERE height <= ?1";

    pub const INSERT_OR_IGNORE_STABLE_BLOCK_TRANSACTIONS: &str = "
        INSERT OR IGNORE INTO stable_block_transactions (height, block_transaction_index, transaction_id)
        SELECT height, block_transaction_index, transaction_id
        FROM new_block_transactions WHERE height IS NOT NULL AND height <= ?1";

    pub const INSERT_OR_IGNORE_STABLE_TRANSACTIONS: &str = "
        INSERT OR IGNORE INTO stable_transactions
        SELECT
            t.id, bt.height, bt.block_transaction_index, t.signature, t.format, t.last_tx,
            t.owner_address, t.target, t.quantity, t.reward, t.data_size, t.data_root,
            t.tag_count, t.content_type, t.created_at, t.indexed_at
        FROM new_transactions t
        JOIN new_block_transactions bt ON bt.transaction_id = t.id
        WHERE bt.height IS NOT NULL AND bt.height <= ?1";

    pub const INSERT_OR_IGNORE_STABLE_TRANSACTION_TAGS: &str = "
        INSERT OR IGNORE INTO stable_transaction_tags
        SELECT
            tt.tag_name_hash, tt.tag_value_hash, bt.height, bt.block_transaction_index,
            tt.transaction_id, tt.tag_index, tt.indexed_at
        FROM new_transaction_tags tt
        JOIN new_block_transactions bt ON bt.transaction_id = tt.transaction_id
        WHERE bt.height IS NOT NULL AND bt.height <= ?1";

    pub const DELETE_STALE_NEW_BLOCKS: &str = "DELETE FROM new_blocks WHERE height <= ?1";
    pub const DELETE_STALE_NEW_BLOCK_TRANSACTIONS: &str =
        "DELETE FROM new_block_transactions WHERE height IS NOT NULL AND height <= ?1";
    pub const DELETE_STALE_NEW_TRANSACTIONS: &str = "
        DELETE FROM new_transactions
        WHERE (height IS NOT NULL AND height <= ?1) OR indexed_at < ?2";
    pub const DELETE_STALE_NEW_TRANSACTION_TAGS: &str = "
        DELETE FROM new_transaction_tags
        WHERE transaction_id NOT IN (SELECT id FROM new_transactions)";
    pub const DELETE_STALE_MISSING_TRANSACTIONS: &str =
        "DELETE FROM missing_transactions WHERE height <= ?1";

    pub const RESET_CLEAR_NEW_TRANSACTION_HEIGHTS_ABOVE: &str = "
        UPDATE new_transactions SET height = NULL
        WHERE id IN (SELECT transaction_id FROM new_block_transactions WHERE height > ?1)";
    pub const RESET_TRUNCATE_NEW_BLOCKS_ABOVE: &str = "DELETE FROM new_blocks WHERE height > ?1";
    pub const RESET_TRUNCATE_NEW_BLOCK_TRANSACTIONS_ABOVE: &str =
        "DELETE FROM new_block_transactions WHERE height > ?1";
    pub const RESET_TRUNCATE_MISSING_TRANSACTIONS_ABOVE: &str =
        "DELETE FROM missing_transactions WHERE height > ?1";

    pub const SELECT_STABLE_BLOCK_COUNT: &str = "SELECT COUNT(*) FROM stable_blocks";
    pub const SELECT_STABLE_BLOCK_HEIGHT_RANGE: &str =
        "SELECT MIN(height), MAX(height) FROM stable_blocks";
    pub const SELECT_STABLE_TX_COUNT: &str = "SELECT COUNT(*) FROM stable_transactions";
    pub const SELECT_STABLE_BLOCK_TX_COUNT: &str =
        "SELECT COUNT(*) FROM stable_block_transactions";
    pub const SELECT_STABLE_TX_IDS_NOT_IN_BLOCK_TRANSACTIONS: &str = "
        SELECT id FROM stable_transactions
        WHERE id NOT IN (SELECT transaction_id FROM stable_block_transactions)";

    /// Propagates a newly-linked block height onto data items already sitting
    /// in `bundles.new_data_items` for a root tx that has just been confirmed.
    /// Valid only on the `core` connection, which attaches `bundles` at open.
    pub const PROPAGATE_HEIGHT_TO_BUNDLE_DATA_ITEMS: &str = "
        UPDATE bundles.new_data_items SET height = ?2
        WHERE root_transaction_id = ?1 AND height IS NULL";

    pub const INSERT_OR_IGNORE_TRANSACTION_OFFSET: &str = "
        INSERT OR IGNORE INTO transaction_offsets (transaction_id, chain_offset, chain_size)
        VALUES (?1, ?2, ?3)";

    pub const SELECT_TX_IDS_MISSING_OFFSETS: &str = "
        SELECT id FROM new_transactions
        WHERE id NOT IN (SELECT transaction_id FROM transaction_offsets)
        UNION
        SELECT id FROM stable_transactions
        WHERE id NOT IN (SELECT transaction_id FROM transaction_offsets)";

    /// Backs `ChainSource::get_data_root`: checks `new_transactions` first
    /// since a just-ingested tx is more likely to still be there than
    /// already promoted.
    pub const SELECT_DATA_ROOT_BY_TX_ID: &str = "
        SELECT data_root FROM new_transactions WHERE id = ?1 AND data_root IS NOT NULL
        UNION ALL
        SELECT data_root FROM stable_transactions WHERE id = ?1 AND data_root IS NOT NULL
        LIMIT 1";

    /// Backs `ChainSource::get_offset`.
    pub const SELECT_OFFSET_BY_TX_ID: &str =
        "SELECT chain_offset, chain_size FROM transaction_offsets WHERE transaction_id = ?1";

    /// Whether `id` names a transaction or data item that has already been
    /// promoted past `MAX_FORK_DEPTH`. Valid only on the `core` connection
    /// (bundles is attached there), used by `ContiguousDataIndex::get_data_attributes`
    /// to resolve its `stable` flag.
    pub const SELECT_IS_CONFIRMED_STABLE: &str = "
        SELECT 1 FROM stable_transactions WHERE id = ?1
        UNION ALL
        SELECT 1 FROM bundles.stable_data_items WHERE id = ?1
        LIMIT 1";

    /// Same check keyed by a transaction's data root rather than its id.
    /// Bundled data items never carry their own `data_root` (only the
    /// root transaction that carries their bytes does), so this only
    /// resolves stability for root-level uploads.
    pub const SELECT_IS_CONFIRMED_STABLE_BY_ROOT: &str =
        "SELECT 1 FROM stable_transactions WHERE data_root = ?1 LIMIT 1";
}

pub mod bundles {
    /// Valid only on the `bundles` connection, which attaches `core` at open.
    pub const SELECT_ROOT_TX_HEIGHT: &str = "
        SELECT height FROM core.new_transactions WHERE id = ?1
        UNION ALL
        SELECT height FROM core.stable_transactions WHERE id = ?1
        LIMIT 1";

    pub const SELECT_FILTER_ID: &str = "SELECT id FROM filters WHERE filter = ?1";
    pub const INSERT_OR_IGNORE_FILTER: &str =
        "INSERT OR IGNORE INTO filters (filter) VALUES (?1)";

    pub const SELECT_BUNDLE_FORMAT_ID: &str =
        "SELECT id FROM bundle_formats WHERE format = ?1";
    pub const INSERT_OR_IGNORE_BUNDLE_FORMAT: &str =
        "INSERT OR IGNORE INTO bundle_formats (format) VALUES (?1)";

    pub const UPSERT_BUNDLE_RECORD: &str = "
        INSERT INTO bundle_records (
            id, root_transaction_id, format_id, unbundle_filter_id, index_filter_id,
            data_item_count, matched_data_item_count, queued_at, skipped_at, unbundled_at,
            fully_indexed_at
        ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)
        ON CONFLICT(id) DO UPDATE SET
            format_id = excluded.format_id,
            unbundle_filter_id = excluded.unbundle_filter_id,
            index_filter_id = excluded.index_filter_id,
            data_item_count = COALESCE(excluded.data_item_count, bundle_records.data_item_count),
            matched_data_item_count = COALESCE(excluded.matched_data_item_count, bundle_records.matched_data_item_count),
            queued_at = COALESCE(bundle_records.queued_at, excluded.queued_at),
            skipped_at = COALESCE(excluded.skipped_at, bundle_records.skipped_at),
            unbundled_at = COALESCE(excluded.unbundled_at, bundle_records.unbundled_at),
            fully_indexed_at = COALESCE(excluded.fully_indexed_at, bundle_records.fully_indexed_at)";

    pub const UPDATE_BUNDLE_FULLY_INDEXED_AT: &str =
        "UPDATE bundle_records SET fully_indexed_at = ?2 WHERE id = ?1";

    pub const UPDATE_BUNDLE_FOR_FILTER_CHANGE: &str = "
        UPDATE bundle_records SET
            unbundle_filter_id = ?2,
            index_filter_id = ?3,
            matched_data_item_count = NULL,
            fully_indexed_at = NULL
        WHERE id = ?1";

    pub const SELECT_FAILED_BUNDLE_IDS: &str = "
        SELECT id FROM bundle_records
        WHERE unbundled_at IS NOT NULL AND fully_indexed_at IS NULL AND skipped_at IS NULL";

    pub const SELECT_STALE_BUNDLE_IDS: &str = "
        SELECT id FROM bundle_records
        WHERE fully_indexed_at IS NULL AND queued_at IS NOT NULL AND queued_at < ?1";

    pub const INSERT_OR_IGNORE_WALLET: &str =
        "INSERT OR IGNORE INTO wallets (address, public_modulus) VALUES (?1, ?2)";
    pub const INSERT_OR_IGNORE_TAG_NAME: &str =
        "INSERT OR IGNORE INTO tag_names (hash, name) VALUES (?1, ?2)";
    pub const INSERT_OR_IGNORE_TAG_VALUE: &str =
        "INSERT OR IGNORE INTO tag_values (hash, value) VALUES (?1, ?2)";

    pub const UPSERT_NEW_DATA_ITEM: &str = "
        INSERT INTO new_data_items (
            id, parent_id, root_transaction_id, owner_address, anchor, signature, target,
            data_offset, data_size, tag_count, content_type, height, indexed_at, filter_id
        ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14)
        ON CONFLICT(id) DO UPDATE SET
            height = COALESCE(excluded.height, new_data_items.height)";

    pub const UPSERT_NEW_DATA_ITEM_TAG: &str = "
        INSERT OR IGNORE INTO new_data_item_tags
            (tag_name_hash, tag_value_hash, data_item_id, owner_address, tag_index, indexed_at, height)
        VALUES (?1,?2,?3,?4,?5,?6,?7)";

    pub const RESET_CLEAR_NEW_DATA_ITEM_HEIGHTS_ABOVE: &str =
        "UPDATE new_data_items SET height = NULL WHERE height > ?1";

    pub const SELECT_MAX_STABLE_DATA_ITEM_HEIGHT: &str =
        "SELECT MAX(height) FROM stable_data_items";

    pub const INSERT_OR_IGNORE_STABLE_DATA_ITEMS: &str = "
        INSERT OR IGNORE INTO stable_data_items
        SELECT
            id, parent_id, root_transaction_id, owner_address, anchor, signature, target,
            data_offset, data_size, tag_count, content_type, height, NULL, indexed_at, filter_id
        FROM new_data_items WHERE height IS NOT NULL AND height <= ?1";

    pub const INSERT_OR_IGNORE_STABLE_DATA_ITEM_TAGS: &str = "
        INSERT OR IGNORE INTO stable_data_item_tags
        SELECT
            it.tag_name_hash, it.tag_value_hash, di.height, 0, it.data_item_id, it.tag_index, it.indexed_at
        FROM new_data_item_tags it
        JOIN new_data_items di ON di.id = it.data_item_id
        WHERE di.height IS NOT NULL AND di.height <= ?1";

    pub const DELETE_STALE_NEW_DATA_ITEMS: &str = "
        DELETE FROM new_data_items
        WHERE (height IS NOT NULL AND height <= ?1) OR indexed_at < ?2";
    pub const DELETE_STALE_NEW_DATA_ITEM_TAGS: &str = "
        DELETE FROM new_data_item_tags
        WHERE data_item_id NOT IN (SELECT id FROM new_data_items)";
}

pub mod data {
    pub const INSERT_OR_IGNORE_DATA_HASH: &str = "
        INSERT OR IGNORE INTO data_hashes
            (hash, data_size, original_source_content_type, cached_at, indexed_at)
        VALUES (?1, ?2, ?3, ?4, ?5)";
    pub const INSERT_OR_IGNORE_DATA_ID: &str =
        "INSERT OR IGNORE INTO data_ids (id, hash) VALUES (?1, ?2)";
    pub const INSERT_OR_IGNORE_DATA_ROOT: &str =
        "INSERT OR IGNORE INTO data_roots (data_root, hash) VALUES (?1, ?2)";
    pub const SELECT_DATA_ATTRIBUTES_BY_ID: &str = "
        SELECT h.hash, h.data_size, h.original_source_content_type, h.cached_at, h.indexed_at
        FROM data_ids i JOIN data_hashes h ON h.hash = i.hash
        WHERE i.id = ?1";
    pub const SELECT_DATA_ATTRIBUTES_BY_ROOT: &str = "
        SELECT h.hash, h.data_size, h.original_source_content_type, h.cached_at, h.indexed_at
        FROM data_roots r JOIN data_hashes h ON h.hash = r.hash
        WHERE r.data_root = ?1";
    pub const INSERT_OR_IGNORE_NESTED_DATA_ID: &str = "
        INSERT OR IGNORE INTO nested_data_ids (id, parent_id, data_offset, data_size)
        VALUES (?1, ?2, ?3, ?4)";
    pub const INSERT_OR_IGNORE_NESTED_DATA_HASH: &str = "
        INSERT OR IGNORE INTO nested_data_hashes (hash, parent_id, data_offset)
        VALUES (?1, ?2, ?3)";
    pub const SELECT_NESTED_PARENT_BY_ID: &str =
        "SELECT parent_id, data_offset, data_size FROM nested_data_ids WHERE id = ?1";
    pub const SELECT_NESTED_PARENT_BY_HASH: &str =
        "SELECT parent_id, data_offset FROM nested_data_hashes WHERE hash = ?1";
}

pub mod moderation {
    pub const SELECT_ID_BLOCKED: &str = "SELECT 1 FROM blocked_ids WHERE id = ?1";
    pub const SELECT_HASH_BLOCKED: &str = "SELECT 1 FROM blocked_hashes WHERE hash = ?1";
    pub const INSERT_OR_IGNORE_BLOCK_SOURCE: &str =
        "INSERT OR IGNORE INTO block_sources (name) VALUES (?1)";
    pub const SELECT_BLOCK_SOURCE_ID: &str = "SELECT id FROM block_sources WHERE name = ?1";
    pub const INSERT_OR_IGNORE_BLOCKED_ID: &str =
        "INSERT OR IGNORE INTO blocked_ids (id, source_id, notes) VALUES (?1, ?2, ?3)";
    pub const INSERT_OR_IGNORE_BLOCKED_HASH: &str =
        "INSERT OR IGNORE INTO blocked_hashes (hash, source_id, notes) VALUES (?1, ?2, ?3)";
}
