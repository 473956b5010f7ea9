//! Top-level `GqlQueryable` entry points: merges the new/stable groups per
//! spec §4.4 "Pagination" and turns raw rows into pages of nodes.

use crate::error::QueryError;
use crate::node;
use crate::source::{self, RawRow, Source};
use crate::types::{BundledIn, Edge, GqlBlockRef, GqlBlocksArgs, GqlTransactionNode, GqlTransactionsArgs, Page, PageInfo};
use cgw_types::encoding::Cursor;
use cgw_types::entities::TagMatchMode;
use cgw_types::ids::{BlockId, TxId};
use rusqlite::Connection;
use std::cmp::Ordering;
use std::collections::HashSet;

fn active_sources(bundled_in: &BundledIn) -> (Vec<Source>, Vec<Source>) {
    // (new-group sources, stable-group sources), per spec §4.4 "bundledIn
    // controls UNION composition".
    match bundled_in {
        BundledIn::Omitted => (
            vec![Source::NewTx, Source::NewItem],
            vec![Source::StableTx, Source::StableItem],
        ),
        BundledIn::Null => (vec![Source::NewTx], vec![Source::StableTx]),
        BundledIn::Ids(_) => (vec![Source::NewItem], vec![Source::StableItem]),
    }
}

fn cmp_option<T: Ord>(a: Option<T>, b: Option<T>, ascending: bool) -> Ordering {
    // NULLS FIRST for DESC, NULLS LAST for ASC (spec §4.4, §8 invariant 6).
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => {
            if ascending {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (Some(_), None) => {
            if ascending {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (Some(a), Some(b)) => {
            if ascending {
                a.cmp(&b)
            } else {
                b.cmp(&a)
            }
        }
    }
}

fn cmp_bytes(a: &[u8], b: &[u8], ascending: bool) -> Ordering {
    if ascending {
        a.cmp(b)
    } else {
        b.cmp(a)
    }
}

/// Total order over raw rows: `(height, blockTransactionIndex, dataItemId,
/// indexedAt, id)`, matching each source query's own `ORDER BY` so a
/// plain merge of already-sorted per-source results stays correctly sorted.
fn compare_rows(a: &RawRow, b: &RawRow, ascending: bool) -> Ordering {
    cmp_option(a.height, b.height, ascending)
        .then_with(|| cmp_option(a.block_transaction_index, b.block_transaction_index, ascending))
        .then_with(|| cmp_bytes(&a.data_item_id, &b.data_item_id, ascending))
        .then_with(|| {
            if ascending {
                a.indexed_at.cmp(&b.indexed_at)
            } else {
                b.indexed_at.cmp(&a.indexed_at)
            }
        })
        .then_with(|| cmp_bytes(&a.id, &b.id, ascending))
}

fn merge_sorted(mut lists: Vec<Vec<RawRow>>, ascending: bool, limit: usize) -> Vec<RawRow> {
    let mut out = Vec::new();
    loop {
        let mut best: Option<(usize, Ordering)> = None;
        for (i, list) in lists.iter().enumerate() {
            if let Some(head) = list.first() {
                let better = match best {
                    None => true,
                    Some((j, _)) => compare_rows(head, &lists[j][0], ascending) == Ordering::Less,
                };
                if better {
                    best = Some((i, Ordering::Equal));
                }
            }
        }
        match best {
            None => break,
            Some((i, _)) => {
                out.push(lists[i].remove(0));
                if out.len() >= limit {
                    break;
                }
            }
        }
    }
    out
}

/// Queries every source in `sources`, merges them into the group's own sort
/// order, and clips to `limit`.
#[allow(clippy::too_many_arguments)]
fn query_group(
    conn: &Connection,
    sources: &[Source],
    args: &GqlTransactionsArgs,
    cursor: Option<&Cursor>,
    min_height_override: Option<u64>,
    max_height_override: Option<u64>,
    limit: u32,
) -> Result<Vec<RawRow>, QueryError> {
    let ascending = args.sort_order.is_ascending();
    let mut lists = Vec::new();
    for &source in sources {
        lists.push(source::query_source(
            conn,
            source,
            args,
            cursor,
            min_height_override,
            max_height_override,
            limit,
        )?);
    }
    Ok(merge_sorted(lists, ascending, limit as usize))
}

/// Builds a page of transactions/data items, spec §4.4 "Pagination": query
/// the direction-leading group first; only if it falls short of `pageSize`
/// does the trailing group get queried, with its height bound tightened to
/// sit strictly past the leading group's last row.
pub fn get_gql_transactions(conn: &Connection, args: &GqlTransactionsArgs) -> Result<Page<GqlTransactionNode>, QueryError> {
    let cursor = args.cursor.as_deref().map(Cursor::decode).transpose()?;
    let ascending = args.sort_order.is_ascending();
    let limit = args.page_size + 1;

    let (new_sources, stable_sources) = active_sources(&args.bundled_in);

    let (leading, trailing_sources) = if ascending {
        (
            query_group(conn, &stable_sources, args, cursor.as_ref(), None, None, limit)?,
            &new_sources,
        )
    } else {
        (
            query_group(conn, &new_sources, args, cursor.as_ref(), None, None, limit)?,
            &stable_sources,
        )
    };

    let mut combined = leading;
    if (combined.len() as u32) < limit {
        let last_height = combined.last().and_then(|r| r.height);
        let (min_override, max_override) = if ascending {
            (last_height.map(|h| h + 1), None)
        } else {
            (None, last_height.and_then(|h| h.checked_sub(1)))
        };
        // No bound could be derived (leading group was empty or entirely
        // NULL-height): fall through unconstrained rather than skip the
        // trailing group, the only case it's safe to let both groups share
        // a height range is when the leading group contributed nothing to
        // overlap against.
        let trailing = query_group(
            conn,
            trailing_sources,
            args,
            cursor.as_ref(),
            min_override.or(args.min_height),
            max_override.or(args.max_height),
            limit - combined.len() as u32,
        )?;
        combined.extend(trailing);
    }

    let has_next_page = (combined.len() as u32) > args.page_size;
    combined.truncate(args.page_size as usize);

    let mut edges = Vec::with_capacity(combined.len());
    for row in combined {
        let cursor = node::cursor_for_row(&row).encode();
        let node = node::build_node(conn, row)?;
        edges.push(Edge { cursor, node });
    }

    Ok(Page {
        page_info: PageInfo { has_next_page },
        edges,
    })
}

fn compare_nodes(a: &GqlTransactionNode, b: &GqlTransactionNode, ascending: bool) -> Ordering {
    cmp_option(a.height, b.height, ascending)
        .then_with(|| cmp_option(a.block_transaction_index, b.block_transaction_index, ascending))
        .then_with(|| {
            if ascending {
                a.data_item_id.cmp(&b.data_item_id)
            } else {
                b.data_item_id.cmp(&a.data_item_id)
            }
        })
        .then_with(|| {
            if ascending {
                a.indexed_at.cmp(&b.indexed_at)
            } else {
                b.indexed_at.cmp(&a.indexed_at)
            }
        })
        .then_with(|| if ascending { a.id.cmp(&b.id) } else { b.id.cmp(&a.id) })
}

/// `getGqlSearchByTags` (spec §9 Open Question): the same cursor-ordered
/// planner path as `get_gql_transactions`, parameterized by how `args.tags`
/// is matched. `Exact` and `FuzzyAnd` delegate straight through — both
/// already mean "every filter matches, multiple values OR'd" against this
/// schema. `Wildcard` delegates too, since the `LIKE`-vs-hash distinction is
/// resolved entirely inside `tags::build_tag_joins`. `FuzzyOr` is the one
/// mode this AND-shaped join tree can't express directly: a row qualifies
/// if it matches *any* filter, not all of them, so it's run as one
/// independent `Exact` query per filter and the results are merged and
/// deduplicated here.
pub fn get_gql_search_by_tags(
    conn: &Connection,
    args: &GqlTransactionsArgs,
    mode: TagMatchMode,
) -> Result<Page<GqlTransactionNode>, QueryError> {
    if mode != TagMatchMode::FuzzyOr || args.tags.len() <= 1 {
        let mut scoped = args.clone();
        scoped.tag_mode = mode;
        return get_gql_transactions(conn, &scoped);
    }

    let ascending = args.sort_order.is_ascending();
    let mut seen = HashSet::new();
    let mut combined: Vec<Edge<GqlTransactionNode>> = Vec::new();

    for tag in &args.tags {
        let mut scoped = args.clone();
        scoped.tags = vec![tag.clone()];
        scoped.tag_mode = TagMatchMode::Exact;
        scoped.page_size = args.page_size + 1;
        let page = get_gql_transactions(conn, &scoped)?;
        for edge in page.edges {
            if seen.insert((edge.node.data_item_id, edge.node.id.clone())) {
                combined.push(edge);
            }
        }
    }

    combined.sort_by(|a, b| compare_nodes(&a.node, &b.node, ascending));
    let has_next_page = (combined.len() as u32) > args.page_size;
    combined.truncate(args.page_size as usize);

    Ok(Page {
        page_info: PageInfo { has_next_page },
        edges: combined,
    })
}

/// Point lookup by transaction/data-item id, checking the new group before
/// the stable one since recently-ingested rows live there first.
pub fn get_gql_transaction(conn: &Connection, id: &TxId) -> Result<Option<GqlTransactionNode>, QueryError> {
    let args = GqlTransactionsArgs {
        page_size: 1,
        ids: Some(vec![*id]),
        ..Default::default()
    };
    for source in [Source::NewTx, Source::NewItem, Source::StableTx, Source::StableItem] {
        let rows = source::query_source(conn, source, &args, None, None, None, 1)?;
        if let Some(row) = rows.into_iter().next() {
            return Ok(Some(node::build_node(conn, row)?));
        }
    }
    Ok(None)
}

fn block_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(u64, GqlBlockRef)> {
    let height: i64 = row.get(0)?;
    let indep_hash: Vec<u8> = row.get(1)?;
    let previous_block: Option<Vec<u8>> = row.get(2)?;
    let timestamp: i64 = row.get(3)?;
    Ok((
        height as u64,
        GqlBlockRef {
            indep_hash: BlockId::try_from(indep_hash.as_slice()).unwrap_or(BlockId::zero()),
            timestamp,
            previous_block: previous_block.and_then(|b| BlockId::try_from(b.as_slice()).ok()),
            height: height as u64,
        },
    ))
}

fn query_blocks_table(conn: &Connection, table: &str, args: &GqlBlocksArgs, limit: u32) -> Result<Vec<(u64, GqlBlockRef)>, QueryError> {
    let ascending = args.sort_order.map(|s| s.is_ascending()).unwrap_or(false);
    let dir = if ascending { "ASC" } else { "DESC" };
    let mut where_clauses = Vec::new();
    let mut params: Vec<rusqlite::types::Value> = Vec::new();

    if let Some(ids) = &args.ids {
        let placeholders = vec!["?"; ids.len()].join(",");
        where_clauses.push(format!("indep_hash IN ({placeholders})"));
        params.extend(ids.iter().map(|id| rusqlite::types::Value::Blob(id.as_bytes().to_vec())));
    }
    if let Some(min_height) = args.min_height {
        where_clauses.push("height >= ?".to_string());
        params.push(rusqlite::types::Value::Integer(min_height as i64));
    }
    if let Some(max_height) = args.max_height {
        where_clauses.push("height <= ?".to_string());
        params.push(rusqlite::types::Value::Integer(max_height as i64));
    }
    if let Some(cursor_height) = args.cursor.as_deref().map(|s| s.parse::<i64>()).transpose().map_err(|_| {
        QueryError::CursorInvalid(cgw_types::EncodingError::CursorInvalid("block cursor is not an integer height".into()))
    })? {
        let op = if ascending { ">" } else { "<" };
        where_clauses.push(format!("height {op} ?"));
        params.push(rusqlite::types::Value::Integer(cursor_height));
    }

    let where_sql = if where_clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", where_clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT height, indep_hash, previous_block, block_timestamp FROM {table} \
         {where_sql} ORDER BY height {dir} LIMIT ?"
    );
    params.push(rusqlite::types::Value::Integer(limit as i64));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), block_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Lists blocks from `new_blocks` and `stable_blocks`, merged by height.
/// The cursor is the decimal height of the last row seen, unlike the
/// transaction planner's opaque tuple cursor: blocks have no competing
/// secondary key to break ties on.
pub fn get_gql_blocks(conn: &Connection, args: &GqlBlocksArgs) -> Result<Page<GqlBlockRef>, QueryError> {
    let ascending = args.sort_order.map(|s| s.is_ascending()).unwrap_or(false);
    let limit = args.page_size + 1;

    let new_rows = query_blocks_table(conn, "new_blocks", args, limit)?;
    let stable_rows = query_blocks_table(conn, "stable_blocks", args, limit)?;

    let mut combined: Vec<(u64, GqlBlockRef)> = new_rows.into_iter().chain(stable_rows).collect();
    combined.sort_by(|a, b| if ascending { a.0.cmp(&b.0) } else { b.0.cmp(&a.0) });
    combined.dedup_by_key(|(h, _)| *h);
    combined.truncate(limit as usize);

    let has_next_page = (combined.len() as u32) > args.page_size;
    combined.truncate(args.page_size as usize);

    let edges = combined
        .into_iter()
        .map(|(height, block)| Edge {
            cursor: height.to_string(),
            node: block,
        })
        .collect();

    Ok(Page {
        page_info: PageInfo { has_next_page },
        edges,
    })
}

pub fn get_gql_block(conn: &Connection, id: &BlockId) -> Result<Option<GqlBlockRef>, QueryError> {
    for table in ["new_blocks", "stable_blocks"] {
        let sql = format!("SELECT height, indep_hash, previous_block, block_timestamp FROM {table} WHERE indep_hash = ?1");
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query_map([id.as_bytes().to_vec()], block_row)?;
        if let Some(row) = rows.next() {
            return Ok(Some(row?.1));
        }
    }
    Ok(None)
}
