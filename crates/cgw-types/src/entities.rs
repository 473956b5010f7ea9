//! Domain entities. Field-for-field restatement of spec §3 "Data Model".

use crate::ids::{BlockId, ContentHash, DataItemId, DataRoot, NameHash, TxId, ValueHash, WalletAddress};
use serde::{Deserialize, Serialize};

/// A chain block. Heights are unique in `new_blocks`; `stable_blocks` is a
/// gapless prefix in height once promoted (spec §3 "Block" invariants).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    pub indep_hash: BlockId,
    pub previous_block: Option<BlockId>,
    pub nonce: Vec<u8>,
    pub mining_hash: Vec<u8>,
    pub timestamp: i64,
    pub difficulty: String,
    pub cumulative_difficulty: String,
    pub last_retarget: i64,
    /// Empty when the reward is unclaimed.
    pub reward_address: Option<WalletAddress>,
    pub reward_pool: String,
    pub block_size: u64,
    pub weave_size: u64,
    /// Current (dividend, divisor) USD↔token rate.
    pub usd_to_token_rate: (u64, u64),
    /// Scheduled (dividend, divisor) USD↔token rate.
    pub scheduled_usd_to_token_rate: (u64, u64),
    pub hash_list_merkle: Option<Vec<u8>>,
    pub wallet_list_hash: Vec<u8>,
    pub tx_root: Option<Vec<u8>>,
    pub tx_count: u32,
    pub missing_tx_count: u32,
}

/// A transaction. `height` is `None` until the owning block is linked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub signature: Vec<u8>,
    pub format: u32,
    pub last_tx: Option<TxId>,
    pub owner_address: WalletAddress,
    pub target: Option<WalletAddress>,
    /// Big-integer, carried as a decimal string (spec §9 design note).
    pub quantity: String,
    pub reward: String,
    pub data_size: u64,
    pub data_root: Option<DataRoot>,
    pub tag_count: u32,
    pub content_type: Option<String>,
    pub created_at: i64,
    pub indexed_at: i64,
    pub height: Option<u64>,
}

/// A (name, value) pair attached to a transaction or data item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: Vec<u8>,
    pub value: Vec<u8>,
}

impl Tag {
    pub fn name_hash(&self) -> NameHash {
        NameHash::of(&self.name)
    }

    pub fn value_hash(&self) -> ValueHash {
        ValueHash::of(&self.value)
    }
}

/// A bundled sub-transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataItem {
    pub id: DataItemId,
    /// The enclosing bundle transaction or enclosing data item.
    pub parent_id: DataItemId,
    /// The outermost on-chain transaction ultimately carrying this item.
    pub root_tx_id: TxId,
    pub owner_address: WalletAddress,
    pub anchor: Vec<u8>,
    pub signature: Vec<u8>,
    pub target: Option<WalletAddress>,
    pub data_offset: u64,
    pub data_size: u64,
    pub tag_count: u32,
    pub content_type: Option<String>,
    pub height: Option<u64>,
    pub indexed_at: i64,
    /// Opaque index-filter selector string, normalized via `filters`.
    pub filter: Option<String>,
}

/// Lifecycle record for a bundle transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleRecord {
    pub id: TxId,
    pub root_tx_id: TxId,
    pub format: String,
    pub unbundle_filter: Option<String>,
    pub index_filter: Option<String>,
    pub data_item_count: Option<u32>,
    pub matched_data_item_count: Option<u32>,
    pub queued_at: Option<i64>,
    pub skipped_at: Option<i64>,
    pub unbundled_at: Option<i64>,
    pub fully_indexed_at: Option<i64>,
}

/// The canonical content-hash record in the `data` store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataHash {
    pub hash: ContentHash,
    pub data_size: u64,
    pub original_source_content_type: Option<String>,
    pub cached_at: Option<i64>,
    pub indexed_at: i64,
}

/// Attributes resolved for a tx/data-item id or data root, per
/// `ContiguousDataIndex::get_data_attributes` (spec §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataAttributes {
    pub hash: ContentHash,
    pub data_size: u64,
    pub content_type: Option<String>,
    pub is_manifest: bool,
    pub stable: bool,
    pub verified: bool,
}

/// A nested entry describing a sub-range within a parent's payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedDataParent {
    pub parent_id: DataItemId,
    pub data_offset: u64,
    pub data_size: Option<u64>,
}

/// A blocked id or hash in the moderation store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockListEntry {
    pub source_id: Option<u32>,
    pub notes: Option<String>,
}

/// Sort order for `GqlQueryable` queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    HeightAsc,
    HeightDesc,
}

impl SortOrder {
    pub fn is_ascending(self) -> bool {
        matches!(self, SortOrder::HeightAsc)
    }
}

/// Tag match semantics for `get_gql_search_by_tags` (spec §9 Open Question).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagMatchMode {
    Exact,
    Wildcard,
    FuzzyAnd,
    FuzzyOr,
}

/// One `{name, values[]}` tag filter constraint (spec §4.4 "Filtering").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter {
    pub name: Vec<u8>,
    pub values: Vec<Vec<u8>>,
}
