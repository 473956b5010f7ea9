//! End-to-end scenario tests (spec §8) driven through the `Gateway` facade
//! rather than directly against `cgw-store`, so these also exercise the
//! worker-pool dispatch path and the promotion wiring in
//! `cgw-gateway::chain_index`.

use cgw_gateway::{BlockListValidator, ChainIndex, ChainOffsetIndex, GatewayConfig, Gateway, GqlQueryable};
use cgw_query::{BundledIn, GqlTransactionsArgs};
use cgw_store::core_store::IncomingTransaction;
use cgw_store::open::StorePaths;
use cgw_types::entities::{Block, SortOrder, Transaction};
use cgw_types::ids::{BlockId, ContentHash, TxId, WalletAddress};
use tempfile::tempdir;

fn test_config() -> (tempfile::TempDir, GatewayConfig) {
    let dir = tempdir().unwrap();
    let paths = StorePaths {
        core: dir.path().join("core.db"),
        bundles: dir.path().join("bundles.db"),
        data: dir.path().join("data.db"),
        moderation: dir.path().join("moderation.db"),
    };
    (dir, GatewayConfig::new(paths))
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

fn tx(seed: u8, height: u64) -> IncomingTransaction {
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
            tag_count: 0,
            content_type: None,
            created_at: 1_700_000_000,
            indexed_at: 1_700_000_000 + height as i64,
            height: Some(height),
        },
        tags: vec![],
    }
}

/// S1 (promote): blocks 0..=54, one tx each. After height 50
/// (`50 % 5 == 0`), `endHeight = 50 - 50 = 0`; `stable_blocks` holds exactly
/// height 0. After height 55, `endHeight = 5`; `stable_blocks` holds 0..=5.
#[tokio::test]
async fn s1_stable_blocks_follow_the_fork_depth_promotion_schedule() {
    let (_dir, config) = test_config();
    let paths = config.store_paths.clone();
    let gateway = Gateway::new(config);
    let chain = gateway.chain_index();

    for h in 0..=50u64 {
        let promoted = chain
            .save_block_and_txs(block(h), vec![tx(h as u8, h)], vec![])
            .await
            .unwrap();
        assert_eq!(promoted, h % 5 == 0);
    }

    // Read stable_blocks directly; the gateway has no dedicated accessor for
    // it (out of the capability-set surface), so a side-channel read
    // connection against the same file is the only way to observe it.
    {
        let core_ro = cgw_store::open::open_store(cgw_store::open::StoreKind::Core, &paths).unwrap();
        let max: i64 = core_ro.query_row("SELECT MAX(height) FROM stable_blocks", [], |row| row.get(0)).unwrap();
        assert_eq!(max, 0);
        let count: i64 = core_ro.query_row("SELECT COUNT(*) FROM stable_blocks", [], |row| row.get(0)).unwrap();
        assert_eq!(count, 1);
    }

    for h in 51..=55u64 {
        chain
            .save_block_and_txs(block(h), vec![tx(h as u8, h)], vec![])
            .await
            .unwrap();
    }

    let core_ro = cgw_store::open::open_store(cgw_store::open::StoreKind::Core, &paths).unwrap();
    let max: i64 = core_ro.query_row("SELECT MAX(height) FROM stable_blocks", [], |row| row.get(0)).unwrap();
    assert_eq!(max, 5);
    let count: i64 = core_ro.query_row("SELECT COUNT(*) FROM stable_blocks", [], |row| row.get(0)).unwrap();
    assert_eq!(count, 6); // heights 0..=5

    gateway.shutdown();
}

/// S2 (reset): after S1's ingestion up to height 55, `resetToHeight(52)`
/// leaves `new_blocks` at heights `<= 52`, leaves `stable_blocks` (still
/// `0..=5`) untouched, and clears `height` on every `new_transactions` row
/// above 52.
#[tokio::test]
async fn s2_reset_to_height_rewinds_new_state_and_spares_stable_state() {
    let (_dir, config) = test_config();
    let paths = config.store_paths.clone();
    let gateway = Gateway::new(config);
    let chain = gateway.chain_index();

    for h in 0..=55u64 {
        chain
            .save_block_and_txs(block(h), vec![tx(h as u8, h)], vec![])
            .await
            .unwrap();
    }

    chain.reset_to_height(52).await.unwrap();

    assert_eq!(chain.get_max_height().await.unwrap(), Some(52));

    let core_ro = cgw_store::open::open_store(cgw_store::open::StoreKind::Core, &paths).unwrap();
    let stable_max: i64 = core_ro.query_row("SELECT MAX(height) FROM stable_blocks", [], |row| row.get(0)).unwrap();
    assert_eq!(stable_max, 5);
    let stable_count: i64 = core_ro.query_row("SELECT COUNT(*) FROM stable_blocks", [], |row| row.get(0)).unwrap();
    assert_eq!(stable_count, 6);

    let orphan_id = TxId::try_from(vec![53u8; 32].as_slice()).unwrap();
    let orphan_height: Option<i64> = core_ro
        .query_row(
            "SELECT height FROM new_transactions WHERE id = ?1",
            rusqlite::params![orphan_id.as_bytes().as_slice()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orphan_height, None);

    gateway.shutdown();
}

/// S6 (moderation): blocking an id by id makes `is_id_blocked` true for that
/// id and leaves every other id/empty id false.
#[tokio::test]
async fn s6_blocked_id_is_reported_blocked_others_are_not() {
    let (_dir, config) = test_config();
    let gateway = Gateway::new(config);
    let moderation = gateway.block_list_validator();

    let blocked = vec![0xAAu8; 32];
    moderation
        .block_data(Some(blocked.clone()), None, Some("manual".into()), None)
        .await
        .unwrap();

    assert!(moderation.is_id_blocked(blocked).await.unwrap());
    assert!(!moderation.is_id_blocked(vec![0xBBu8; 32]).await.unwrap());
    assert!(!moderation.is_id_blocked(vec![]).await.unwrap());
    assert!(!moderation
        .is_hash_blocked(ContentHash::try_from(vec![0xCCu8; 32].as_slice()).unwrap())
        .await
        .unwrap());

    gateway.shutdown();
}

/// Cross-cutting: the same transaction ingested through `ChainIndex` is
/// immediately queryable through `GqlQueryable` and its offset is trackable
/// through `ChainOffsetIndex`, all via the pool dispatch path.
#[tokio::test]
async fn ingested_transaction_is_queryable_and_its_offset_is_trackable() {
    let (_dir, config) = test_config();
    let gateway = Gateway::new(config);

    let tx_id = TxId::try_from(vec![42u8; 32].as_slice()).unwrap();
    gateway
        .chain_index()
        .save_block_and_txs(block(1), vec![tx(42, 1)], vec![])
        .await
        .unwrap();

    let node = gateway.gql_queryable().get_gql_transaction(tx_id).await.unwrap().unwrap();
    assert_eq!(node.height, Some(1));

    let page = gateway
        .gql_queryable()
        .get_gql_transactions(GqlTransactionsArgs {
            sort_order: SortOrder::HeightDesc,
            bundled_in: BundledIn::Omitted,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.edges.len(), 1);

    assert_eq!(
        gateway.chain_offset_index().get_tx_ids_missing_offsets().await.unwrap(),
        vec![tx_id]
    );
    gateway.chain_offset_index().save_tx_offset(tx_id, 2000, 100).await.unwrap();
    assert!(gateway
        .chain_offset_index()
        .get_tx_ids_missing_offsets()
        .await
        .unwrap()
        .is_empty());

    gateway.shutdown();
}
