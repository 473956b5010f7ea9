//! Schema DDL for the four stores. Each store keeps a `new_*` family
//! (recent, possibly forked) and, for `core`/`bundles`, a `stable_*` family
//! (content below tip by `MAX_FORK_DEPTH`). See spec §3 "Lifecycle /
//! ownership" and §4.1 "Persistence & statement cache".

pub const CORE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS new_blocks (
    height INTEGER PRIMARY KEY,
    indep_hash BLOB UNIQUE NOT NULL,
    previous_block BLOB,
    nonce BLOB,
    mining_hash BLOB,
    block_timestamp INTEGER NOT NULL,
    diff TEXT,
    cumulative_diff TEXT,
    last_retarget INTEGER,
    reward_address BLOB,
    reward_pool TEXT,
    block_size INTEGER,
    weave_size INTEGER,
    usd_to_token_rate_dividend INTEGER,
    usd_to_token_rate_divisor INTEGER,
    scheduled_usd_to_token_rate_dividend INTEGER,
    scheduled_usd_to_token_rate_divisor INTEGER,
    hash_list_merkle BLOB,
    wallet_list_hash BLOB,
    tx_root BLOB,
    tx_count INTEGER NOT NULL,
    missing_tx_count INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS new_block_transactions (
    block_indep_hash BLOB NOT NULL,
    transaction_id BLOB NOT NULL,
    block_transaction_index INTEGER NOT NULL,
    height INTEGER,
    PRIMARY KEY (block_indep_hash, transaction_id)
);
CREATE INDEX IF NOT EXISTS idx_new_block_transactions_height
    ON new_block_transactions (height);

CREATE TABLE IF NOT EXISTS wallets (
    address BLOB PRIMARY KEY,
    public_modulus BLOB
);

CREATE TABLE IF NOT EXISTS tag_names (
    hash BLOB PRIMARY KEY,
    name BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS tag_values (
    hash BLOB PRIMARY KEY,
    value BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS new_transactions (
    id BLOB PRIMARY KEY,
    signature BLOB,
    format INTEGER NOT NULL,
    last_tx BLOB,
    owner_address BLOB NOT NULL,
    target BLOB,
    quantity TEXT NOT NULL,
    reward TEXT NOT NULL,
    data_size INTEGER NOT NULL,
    data_root BLOB,
    tag_count INTEGER NOT NULL,
    content_type TEXT,
    created_at INTEGER,
    indexed_at INTEGER NOT NULL,
    height INTEGER
);
CREATE INDEX IF NOT EXISTS idx_new_transactions_height ON new_transactions (height);
CREATE INDEX IF NOT EXISTS idx_new_transactions_owner ON new_transactions (owner_address);
CREATE INDEX IF NOT EXISTS idx_new_transactions_target ON new_transactions (target);

CREATE TABLE IF NOT EXISTS new_transaction_tags (
    tag_name_hash BLOB NOT NULL,
    tag_value_hash BLOB NOT NULL,
    transaction_id BLOB NOT NULL,
    owner_address BLOB NOT NULL,
    tag_index INTEGER NOT NULL,
    indexed_at INTEGER NOT NULL,
    height INTEGER,
    PRIMARY KEY (transaction_id, tag_index)
);
CREATE INDEX IF NOT EXISTS idx_new_transaction_tags_name_value
    ON new_transaction_tags (tag_name_hash, tag_value_hash);

CREATE TABLE IF NOT EXISTS missing_transactions (
    transaction_id BLOB PRIMARY KEY,
    block_indep_hash BLOB NOT NULL,
    height INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS stable_blocks (
    height INTEGER PRIMARY KEY,
    indep_hash BLOB UNIQUE NOT NULL,
    previous_block BLOB,
    nonce BLOB,
    mining_hash BLOB,
    block_timestamp INTEGER NOT NULL,
    diff TEXT,
    cumulative_diff TEXT,
    last_retarget INTEGER,
    reward_address BLOB,
    reward_pool TEXT,
    block_size INTEGER,
    weave_size INTEGER,
    usd_to_token_rate_dividend INTEGER,
    usd_to_token_rate_divisor INTEGER,
    scheduled_usd_to_token_rate_dividend INTEGER,
    scheduled_usd_to_token_rate_divisor INTEGER,
    hash_list_merkle BLOB,
    wallet_list_hash BLOB,
    tx_root BLOB,
    tx_count INTEGER NOT NULL,
    missing_tx_count INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS stable_block_transactions (
    height INTEGER NOT NULL,
    block_transaction_index INTEGER NOT NULL,
    transaction_id BLOB NOT NULL,
    PRIMARY KEY (height, block_transaction_index)
);

CREATE TABLE IF NOT EXISTS stable_transactions (
    id BLOB PRIMARY KEY,
    height INTEGER NOT NULL,
    block_transaction_index INTEGER NOT NULL,
    signature BLOB,
    format INTEGER NOT NULL,
    last_tx BLOB,
    owner_address BLOB NOT NULL,
    target BLOB,
    quantity TEXT NOT NULL,
    reward TEXT NOT NULL,
    data_size INTEGER NOT NULL,
    data_root BLOB,
    tag_count INTEGER NOT NULL,
    content_type TEXT,
    created_at INTEGER,
    indexed_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_stable_transactions_height_btx
    ON stable_transactions (height, block_transaction_index);
CREATE INDEX IF NOT EXISTS idx_stable_transactions_owner ON stable_transactions (owner_address);
CREATE INDEX IF NOT EXISTS idx_stable_transactions_target ON stable_transactions (target);

CREATE TABLE IF NOT EXISTS stable_transaction_tags (
    tag_name_hash BLOB NOT NULL,
    tag_value_hash BLOB NOT NULL,
    height INTEGER NOT NULL,
    block_transaction_index INTEGER NOT NULL,
    transaction_id BLOB NOT NULL,
    tag_index INTEGER NOT NULL,
    indexed_at INTEGER NOT NULL,
    PRIMARY KEY (height, block_transaction_index, tag_index)
);
CREATE INDEX IF NOT EXISTS stable_transaction_tags_tx_id_idx
    ON stable_transaction_tags (transaction_id);
CREATE INDEX IF NOT EXISTS idx_stable_transaction_tags_name_value
    ON stable_transaction_tags (tag_name_hash, tag_value_hash);

-- Absolute weave offset of a tx's data, resolved lazily from the chain
-- source once a tx is confirmed. Content-addressed and immutable once
-- written, so it is not split into new_*/stable_* families like the rest
-- of the chain index.
CREATE TABLE IF NOT EXISTS transaction_offsets (
    transaction_id BLOB PRIMARY KEY,
    chain_offset INTEGER NOT NULL,
    chain_size INTEGER NOT NULL
);
"#;

pub const BUNDLES_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS filters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filter TEXT UNIQUE NOT NULL
);

CREATE TABLE IF NOT EXISTS bundle_formats (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    format TEXT UNIQUE NOT NULL
);

CREATE TABLE IF NOT EXISTS bundle_records (
    id BLOB PRIMARY KEY,
    root_transaction_id BLOB NOT NULL,
    format_id INTEGER,
    unbundle_filter_id INTEGER,
    index_filter_id INTEGER,
    data_item_count INTEGER,
    matched_data_item_count INTEGER,
    queued_at INTEGER,
    skipped_at INTEGER,
    unbundled_at INTEGER,
    fully_indexed_at INTEGER
);

CREATE TABLE IF NOT EXISTS wallets (
    address BLOB PRIMARY KEY,
    public_modulus BLOB
);

CREATE TABLE IF NOT EXISTS tag_names (
    hash BLOB PRIMARY KEY,
    name BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS tag_values (
    hash BLOB PRIMARY KEY,
    value BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS new_data_items (
    id BLOB PRIMARY KEY,
    parent_id BLOB NOT NULL,
    root_transaction_id BLOB NOT NULL,
    owner_address BLOB NOT NULL,
    anchor BLOB,
    signature BLOB,
    target BLOB,
    data_offset INTEGER NOT NULL,
    data_size INTEGER NOT NULL,
    tag_count INTEGER NOT NULL,
    content_type TEXT,
    height INTEGER,
    indexed_at INTEGER NOT NULL,
    filter_id INTEGER
);
CREATE INDEX IF NOT EXISTS idx_new_data_items_height ON new_data_items (height);
CREATE INDEX IF NOT EXISTS idx_new_data_items_parent ON new_data_items (parent_id);
CREATE INDEX IF NOT EXISTS idx_new_data_items_root_tx ON new_data_items (root_transaction_id);

CREATE TABLE IF NOT EXISTS new_data_item_tags (
    tag_name_hash BLOB NOT NULL,
    tag_value_hash BLOB NOT NULL,
    data_item_id BLOB NOT NULL,
    owner_address BLOB NOT NULL,
    tag_index INTEGER NOT NULL,
    indexed_at INTEGER NOT NULL,
    height INTEGER,
    PRIMARY KEY (data_item_id, tag_index)
);
CREATE INDEX IF NOT EXISTS idx_new_data_item_tags_name_value
    ON new_data_item_tags (tag_name_hash, tag_value_hash);

CREATE TABLE IF NOT EXISTS stable_data_items (
    id BLOB PRIMARY KEY,
    parent_id BLOB NOT NULL,
    root_transaction_id BLOB NOT NULL,
    owner_address BLOB NOT NULL,
    anchor BLOB,
    signature BLOB,
    target BLOB,
    data_offset INTEGER NOT NULL,
    data_size INTEGER NOT NULL,
    tag_count INTEGER NOT NULL,
    content_type TEXT,
    height INTEGER NOT NULL,
    block_transaction_index INTEGER,
    indexed_at INTEGER NOT NULL,
    filter_id INTEGER
);
CREATE INDEX IF NOT EXISTS idx_stable_data_items_height
    ON stable_data_items (height, block_transaction_index, id);
CREATE INDEX IF NOT EXISTS idx_stable_data_items_parent ON stable_data_items (parent_id);

CREATE TABLE IF NOT EXISTS stable_data_item_tags (
    tag_name_hash BLOB NOT NULL,
    tag_value_hash BLOB NOT NULL,
    height INTEGER NOT NULL,
    block_transaction_index INTEGER NOT NULL,
    data_item_id BLOB NOT NULL,
    tag_index INTEGER NOT NULL,
    indexed_at INTEGER NOT NULL,
    PRIMARY KEY (height, block_transaction_index, data_item_id, tag_index)
);
CREATE INDEX IF NOT EXISTS stable_data_item_tags_item_id_idx
    ON stable_data_item_tags (data_item_id);
CREATE INDEX IF NOT EXISTS idx_stable_data_item_tags_name_value
    ON stable_data_item_tags (tag_name_hash, tag_value_hash);
"#;

pub const DATA_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS data_hashes (
    hash BLOB PRIMARY KEY,
    data_size INTEGER NOT NULL,
    original_source_content_type TEXT,
    cached_at INTEGER,
    indexed_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS data_ids (
    id BLOB PRIMARY KEY,
    hash BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_data_ids_hash ON data_ids (hash);

CREATE TABLE IF NOT EXISTS data_roots (
    data_root BLOB PRIMARY KEY,
    hash BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_data_roots_hash ON data_roots (hash);

CREATE TABLE IF NOT EXISTS nested_data_ids (
    id BLOB PRIMARY KEY,
    parent_id BLOB NOT NULL,
    data_offset INTEGER NOT NULL,
    data_size INTEGER
);
CREATE INDEX IF NOT EXISTS idx_nested_data_ids_parent ON nested_data_ids (parent_id);

CREATE TABLE IF NOT EXISTS nested_data_hashes (
    hash BLOB PRIMARY KEY,
    parent_id BLOB NOT NULL,
    data_offset INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_nested_data_hashes_parent ON nested_data_hashes (parent_id);
"#;

pub const MODERATION_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS block_sources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL
);

CREATE TABLE IF NOT EXISTS blocked_ids (
    id BLOB PRIMARY KEY,
    source_id INTEGER,
    notes TEXT
);

CREATE TABLE IF NOT EXISTS blocked_hashes (
    hash BLOB PRIMARY KEY,
    source_id INTEGER,
    notes TEXT
);
"#;
