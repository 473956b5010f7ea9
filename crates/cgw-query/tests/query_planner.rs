//! End-to-end planner tests against a real sqlite-backed `cgw-store`,
//! covering the cursor-paging, tag-filter, and bundled-in scenarios.

use cgw_query::{get_gql_search_by_tags, get_gql_transactions, BundledIn, GqlTransactionsArgs, TagMatchMode};
use cgw_store::bundles_store::{save_bundle, save_data_item, DimensionCache};
use cgw_store::core_store::{save_block_and_txs, IncomingTransaction};
use cgw_store::open::{open_store, StoreKind, StorePaths};
use cgw_store::staging::promote_core;
use cgw_types::encoding::Cursor;
use cgw_types::entities::{Block, BundleRecord, DataItem, SortOrder, Tag, TagFilter, Transaction};
use cgw_types::ids::{BlockId, DataItemId, TxId, WalletAddress};
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

fn block(height: u64) -> Block {
    Block {
        height,
        indep_hash: BlockId::try_from(vec![height as u8; 32].as_slice()).unwrap(),
        previous_block: None,
        nonce: vec![],
        mining_hash: vec![],
        timestamp: 1_700_000_000 + height as i64,
        difficulty: "1".into(),
        cumulative_difficulty: "1".into(),
        last_retarget: 0,
        reward_address: None,
        reward_pool: "0".into(),
        block_size: 0,
        weave_size: 0,
        usd_to_token_rate: (1, 1),
        scheduled_usd_to_token_rate: (1, 1),
        hash_list_merkle: None,
        wallet_list_hash: vec![],
        tx_root: None,
        tx_count: 1,
        missing_tx_count: 0,
    }
}

fn tx(seed: u8, height: u64, tags: Vec<Tag>) -> IncomingTransaction {
    IncomingTransaction {
        transaction: Transaction {
            id: TxId::try_from(vec![seed; 32].as_slice()).unwrap(),
            signature: vec![],
            format: 2,
            last_tx: None,
            owner_address: WalletAddress::try_from(vec![9u8; 32].as_slice()).unwrap(),
            target: None,
            quantity: "0".into(),
            reward: "0".into(),
            data_size: 0,
            data_root: None,
            tag_count: tags.len() as u32,
            content_type: Some("text/plain".into()),
            created_at: 1_700_000_000,
            indexed_at: 1_700_000_000 + seed as i64,
            height: Some(height),
        },
        tags,
    }
}

/// S3 (cursor paging): 7 stable txs across heights 1..7, page_size=3,
/// HEIGHT_DESC. Page 1 returns 7,6,5; page 2 returns 4,3,2; page 3 returns 1.
#[test]
fn cursor_paging_walks_stable_transactions_in_height_desc_order() {
    let (_dir, paths) = paths();
    let mut core = open_store(StoreKind::Core, &paths).unwrap();

    for h in 1..=7u64 {
        save_block_and_txs(&mut core, &block(h), &[tx(h as u8, h, vec![])], &[]).unwrap();
    }
    // Promote everything: tip=57 puts end_height = 57-50 = 7, covering 1..=7.
    promote_core(&mut core, 57).unwrap();

    let mut args = GqlTransactionsArgs {
        page_size: 3,
        sort_order: SortOrder::HeightDesc,
        ..Default::default()
    };

    let page1 = get_gql_transactions(&core, &args).unwrap();
    let heights: Vec<u64> = page1.edges.iter().map(|e| e.node.height.unwrap()).collect();
    assert_eq!(heights, vec![7, 6, 5]);
    assert!(page1.page_info.has_next_page);

    args.cursor = Some(page1.edges.last().unwrap().cursor.clone());
    let page2 = get_gql_transactions(&core, &args).unwrap();
    let heights: Vec<u64> = page2.edges.iter().map(|e| e.node.height.unwrap()).collect();
    assert_eq!(heights, vec![4, 3, 2]);
    assert!(page2.page_info.has_next_page);

    args.cursor = Some(page2.edges.last().unwrap().cursor.clone());
    let page3 = get_gql_transactions(&core, &args).unwrap();
    let heights: Vec<u64> = page3.edges.iter().map(|e| e.node.height.unwrap()).collect();
    assert_eq!(heights, vec![1]);
    assert!(!page3.page_info.has_next_page);
}

/// S4 (tag match): a tx with two tags. Matching on one returns it; matching
/// a non-existent value returns nothing; two satisfied constraints still
/// return it exactly once.
#[test]
fn tag_filter_matches_by_value_and_does_not_duplicate_rows() {
    let (_dir, paths) = paths();
    let mut core = open_store(StoreKind::Core, &paths).unwrap();

    let tags = vec![
        Tag {
            name: b"Content-Type".to_vec(),
            value: b"text/plain".to_vec(),
        },
        Tag {
            name: b"App-Name".to_vec(),
            value: b"Foo".to_vec(),
        },
    ];
    save_block_and_txs(&mut core, &block(1), &[tx(1, 1, tags)], &[]).unwrap();

    let matching = get_gql_transactions(
        &core,
        &GqlTransactionsArgs {
            tags: vec![TagFilter {
                name: b"App-Name".to_vec(),
                values: vec![b"Foo".to_vec()],
            }],
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(matching.edges.len(), 1);

    let non_matching = get_gql_transactions(
        &core,
        &GqlTransactionsArgs {
            tags: vec![TagFilter {
                name: b"App-Name".to_vec(),
                values: vec![b"Bar".to_vec()],
            }],
            ..Default::default()
        },
    )
    .unwrap();
    assert!(non_matching.edges.is_empty());

    let both_matching = get_gql_transactions(
        &core,
        &GqlTransactionsArgs {
            tags: vec![
                TagFilter {
                    name: b"App-Name".to_vec(),
                    values: vec![b"Foo".to_vec()],
                },
                TagFilter {
                    name: b"Content-Type".to_vec(),
                    values: vec![b"text/plain".to_vec()],
                },
            ],
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(both_matching.edges.len(), 1);
}

/// S5 (bundle / data item): a bundle-root tx `T` at height 10 and a data
/// item `D` nested in it. `bundledIn=[T]` returns only `D`; `bundledIn=null`
/// returns only `T`; omitted returns both.
#[test]
fn bundled_in_selects_between_transactions_and_nested_items() {
    let (_dir, paths) = paths();
    let mut core = open_store(StoreKind::Core, &paths).unwrap();
    let mut bundles = open_store(StoreKind::Bundles, &paths).unwrap();

    let root_tx_id = TxId::try_from(vec![10u8; 32].as_slice()).unwrap();
    save_block_and_txs(&mut core, &block(10), &[tx(10, 10, vec![])], &[]).unwrap();

    let cache = DimensionCache::new();
    save_bundle(
        &bundles,
        &cache,
        &BundleRecord {
            id: root_tx_id,
            root_tx_id,
            format: "ans-104".into(),
            unbundle_filter: None,
            index_filter: None,
            data_item_count: Some(1),
            matched_data_item_count: Some(1),
            queued_at: Some(1_700_000_000),
            skipped_at: None,
            unbundled_at: Some(1_700_000_050),
            fully_indexed_at: Some(1_700_000_100),
        },
    )
    .unwrap();

    let item = DataItem {
        id: DataItemId::try_from(vec![11u8; 32].as_slice()).unwrap(),
        parent_id: DataItemId::try_from(root_tx_id.as_bytes().as_slice()).unwrap(),
        root_tx_id,
        owner_address: WalletAddress::try_from(vec![9u8; 32].as_slice()).unwrap(),
        anchor: vec![],
        signature: vec![],
        target: None,
        data_offset: 0,
        data_size: 5,
        tag_count: 0,
        content_type: None,
        height: None,
        indexed_at: 1_700_000_050,
        filter: None,
    };
    save_data_item(&mut bundles, &cache, &item, &[]).unwrap();

    let only_item = get_gql_transactions(
        &core,
        &GqlTransactionsArgs {
            bundled_in: BundledIn::Ids(vec![root_tx_id]),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(only_item.edges.len(), 1);
    assert_eq!(only_item.edges[0].node.data_item_id, item.id);

    let only_tx = get_gql_transactions(
        &core,
        &GqlTransactionsArgs {
            bundled_in: BundledIn::Null,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(only_tx.edges.len(), 1);
    assert_eq!(only_tx.edges[0].node.id, root_tx_id.to_base64url());

    let both = get_gql_transactions(&core, &GqlTransactionsArgs::default()).unwrap();
    assert_eq!(both.edges.len(), 2);
}

/// `getGqlSearchByTags` in `FuzzyOr` mode returns a transaction matching
/// either of two disjoint tags exactly once, and excludes one matching
/// neither.
#[test]
fn fuzzy_or_search_matches_any_filter_without_duplicating_rows() {
    let (_dir, paths) = paths();
    let mut core = open_store(StoreKind::Core, &paths).unwrap();

    let app_tag = Tag {
        name: b"App-Name".to_vec(),
        value: b"Foo".to_vec(),
    };
    let custom_tag = Tag {
        name: b"Custom-Key".to_vec(),
        value: b"Bar".to_vec(),
    };
    save_block_and_txs(&mut core, &block(1), &[tx(1, 1, vec![app_tag.clone()])], &[]).unwrap();
    save_block_and_txs(&mut core, &block(2), &[tx(2, 2, vec![custom_tag.clone()])], &[]).unwrap();
    save_block_and_txs(&mut core, &block(3), &[tx(3, 3, vec![])], &[]).unwrap();

    let args = GqlTransactionsArgs {
        tags: vec![
            TagFilter {
                name: app_tag.name.clone(),
                values: vec![app_tag.value.clone()],
            },
            TagFilter {
                name: custom_tag.name.clone(),
                values: vec![custom_tag.value.clone()],
            },
        ],
        ..Default::default()
    };
    let page = get_gql_search_by_tags(&core, &args, TagMatchMode::FuzzyOr).unwrap();
    let mut heights: Vec<u64> = page.edges.iter().map(|e| e.node.height.unwrap()).collect();
    heights.sort_unstable();
    assert_eq!(heights, vec![1, 2]);
}

/// Invalid cursor text fails the request rather than silently paging from
/// the start.
#[test]
fn invalid_cursor_is_rejected() {
    let (_dir, paths) = paths();
    let core = open_store(StoreKind::Core, &paths).unwrap();

    let args = GqlTransactionsArgs {
        cursor: Some("not a valid cursor".into()),
        ..Default::default()
    };
    let err = get_gql_transactions(&core, &args).unwrap_err();
    assert!(matches!(err, cgw_query::QueryError::CursorInvalid(_)));
    let _ = Cursor::decode("also not valid").unwrap_err();
}
