//! Request/response shapes for the query planner. Mirrors spec §4.4's
//! `getGqlTransactions`/`getGqlBlocks` surface.

use cgw_types::entities::{SortOrder, Tag, TagFilter, TagMatchMode};
use cgw_types::ids::{BlockId, DataItemId, TxId, WalletAddress};

/// `bundledIn`'s three-valued semantics (spec §4.4 "Filtering"): an absent
/// filter unions both sources, an explicit `null` restricts to bare
/// transactions, and an explicit id list restricts to data items nested in
/// one of those ids. This can't collapse to `Option<Vec<TxId>>` without
/// losing the "absent vs. explicitly empty-scoped-to-txs-only" distinction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BundledIn {
    #[default]
    Omitted,
    Null,
    Ids(Vec<TxId>),
}

#[derive(Debug, Clone)]
pub struct GqlTransactionsArgs {
    pub page_size: u32,
    pub cursor: Option<String>,
    pub sort_order: SortOrder,
    pub ids: Option<Vec<TxId>>,
    pub recipients: Option<Vec<WalletAddress>>,
    pub owners: Option<Vec<WalletAddress>>,
    pub min_height: Option<u64>,
    pub max_height: Option<u64>,
    pub bundled_in: BundledIn,
    pub tags: Vec<TagFilter>,
    /// How `tags` is matched (spec §9 Open Question). `Exact` is the
    /// original behavior: every filter's name must match and its values are
    /// OR'd. `FuzzyAnd` shares that same AND-of-filters/OR-of-values shape
    /// and so is indistinguishable from `Exact` against this schema, since
    /// exact hash-equality is already the least restrictive per-filter
    /// match this index supports. `Wildcard` compares values by SQL `LIKE`
    /// against the tag's decoded bytes rather than its hash. `FuzzyOr`
    /// matches a row against *any* filter rather than requiring all of
    /// them.
    pub tag_mode: TagMatchMode,
}

impl Default for GqlTransactionsArgs {
    fn default() -> Self {
        Self {
            page_size: 100,
            cursor: None,
            sort_order: SortOrder::HeightDesc,
            ids: None,
            recipients: None,
            owners: None,
            min_height: None,
            max_height: None,
            bundled_in: BundledIn::default(),
            tags: Vec::new(),
            tag_mode: TagMatchMode::Exact,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GqlBlocksArgs {
    pub page_size: u32,
    pub cursor: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub ids: Option<Vec<BlockId>>,
    pub min_height: Option<u64>,
    pub max_height: Option<u64>,
}

/// A block reference embedded in a transaction/data-item node, or the node
/// itself for `getGqlBlocks`.
#[derive(Debug, Clone, PartialEq)]
pub struct GqlBlockRef {
    pub indep_hash: BlockId,
    pub timestamp: i64,
    pub previous_block: Option<BlockId>,
    pub height: u64,
}

/// The uniform node shape produced by both transaction and block queries,
/// spec §4.4 "Four sources": bare transactions carry
/// `data_item_id = BARE_TX_DATA_ITEM_ID` and no `parent_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct GqlTransactionNode {
    pub id: String,
    pub data_item_id: DataItemId,
    pub parent_id: Option<String>,
    pub anchor: Vec<u8>,
    pub signature: Vec<u8>,
    pub target: Option<String>,
    /// Decimal strings: quantity/reward/data_size exceed 64-bit range (spec
    /// §9 design note).
    pub quantity: Option<String>,
    pub reward: Option<String>,
    pub data_size: String,
    pub content_type: Option<String>,
    pub owner_address: String,
    pub public_modulus: Option<Vec<u8>>,
    pub block: Option<GqlBlockRef>,
    pub height: Option<u64>,
    pub block_transaction_index: Option<u32>,
    pub indexed_at: i64,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub has_next_page: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge<T> {
    pub cursor: String,
    pub node: T,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page<T> {
    pub page_info: PageInfo,
    pub edges: Vec<Edge<T>>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            page_info: PageInfo::default(),
            edges: Vec::new(),
        }
    }
}
