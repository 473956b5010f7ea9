//! Tag-join clause construction, spec §4.4 "Filtering" / "Tag-join planning
//! hint" (§9).
//!
//! Low-selectivity tag names (`App-Name`, `Content-Type`) are joined last.
//! The first tag join for `stable_transactions` carries the shared
//! `(height, block_transaction_index)` equi-join columns so the query
//! planner can use the source's own height-ordered index; every subsequent
//! tag join (and every item-source join, since `stable_data_items` doesn't
//! carry a populated `block_transaction_index`) is forced with an
//! `INDEXED BY` hint and correlates on the owner-id column directly, which
//! is the mitigation the original applies against a low-selectivity
//! join-order regression.

use crate::source::Source;
use cgw_types::constants::LOW_SELECTIVITY_TAG_NAMES;
use cgw_types::entities::{TagFilter, TagMatchMode};
use rusqlite::types::Value;

/// Tag table, owner-id column, and (for stable sources) the tag-table index
/// used to force subsequent joins.
fn tag_table(source: Source) -> (&'static str, &'static str, Option<&'static str>) {
    match source {
        Source::StableTx => (
            "stable_transaction_tags",
            "transaction_id",
            Some("stable_transaction_tags_tx_id_idx"),
        ),
        Source::StableItem => (
            "bundles.stable_data_item_tags",
            "data_item_id",
            Some("stable_data_item_tags_item_id_idx"),
        ),
        Source::NewTx => ("new_transaction_tags", "transaction_id", None),
        Source::NewItem => ("bundles.new_data_item_tags", "data_item_id", None),
    }
}

/// Sorts tags so low-selectivity names join last, preserving the caller's
/// relative order within each group (a stable sort, not a re-ranking).
pub fn selectivity_ordered<'a>(tags: &'a [TagFilter]) -> Vec<&'a TagFilter> {
    let mut ordered: Vec<&TagFilter> = tags.iter().collect();
    ordered.sort_by_key(|t| is_low_selectivity(&t.name) as u8);
    ordered
}

fn is_low_selectivity(name: &[u8]) -> bool {
    LOW_SELECTIVITY_TAG_NAMES.iter().any(|n| n.as_bytes() == name)
}

/// The raw `(hash, value)` table backing a source's tag join table, used by
/// `Wildcard` matching to compare decoded bytes rather than a hash.
fn tag_values_table(source: Source) -> &'static str {
    match source {
        Source::StableTx | Source::NewTx => "tag_values",
        Source::StableItem | Source::NewItem => "bundles.tag_values",
    }
}

/// Translates a glob pattern (`*` any run, `?` any one byte) into a SQL
/// `LIKE` pattern, escaping the target's own `%`/`_`/`\` first so they match
/// literally. Non-ASCII bytes pass through unchanged, which is exact for
/// single-byte UTF-8 and merely approximate for the rest — acceptable for
/// the tag values this index sees in practice (`App-Name`, `Content-Type`,
/// and similar ASCII conventions).
fn glob_to_like(pattern: &[u8]) -> String {
    let mut out = String::with_capacity(pattern.len());
    for &b in pattern {
        match b {
            b'*' => out.push('%'),
            b'?' => out.push('_'),
            b'%' => out.push_str("\\%"),
            b'_' => out.push_str("\\_"),
            b'\\' => out.push_str("\\\\"),
            _ => out.push(b as char),
        }
    }
    out
}

/// Builds the `JOIN ...` clauses for every requested tag filter against
/// `base_alias` (`t` for transaction sources, `di` for item sources).
/// Returns the joined SQL fragment and its bound parameters in the order
/// the placeholders appear. `mode` selects hash-equality (`Exact`/
/// `FuzzyAnd`, which collapse to the same join shape against this schema)
/// or `LIKE`-against-decoded-value matching (`Wildcard`). `FuzzyOr` is
/// handled a level up, by `crate::planner::get_gql_search_by_tags` merging
/// independent single-filter queries rather than by this function, since an
/// AND-shaped join tree can't express "any one of these".
pub fn build_tag_joins(source: Source, base_alias: &str, tags: &[TagFilter], mode: TagMatchMode) -> (String, Vec<Value>) {
    if mode == TagMatchMode::Wildcard {
        build_wildcard_joins(source, base_alias, tags)
    } else {
        build_exact_joins(source, base_alias, tags)
    }
}

fn build_wildcard_joins(source: Source, base_alias: &str, tags: &[TagFilter]) -> (String, Vec<Value>) {
    let ordered = selectivity_ordered(tags);
    let (table, id_col, index_hint) = tag_table(source);
    let values_table = tag_values_table(source);
    let is_stable_tx = matches!(source, Source::StableTx);

    let mut sql = String::new();
    let mut params = Vec::new();

    for (i, tag) in ordered.iter().enumerate() {
        let alias = format!("tg{i}");
        let values_alias = format!("tgv{i}");
        let name_hash = cgw_types::ids::NameHash::of(&tag.name);

        let correlation = if i == 0 && is_stable_tx {
            format!(
                "{alias}.height = {base_alias}.height \
                 AND {alias}.block_transaction_index = {base_alias}.block_transaction_index"
            )
        } else if i == 0 {
            format!("{alias}.{id_col} = {base_alias}.id")
        } else {
            format!("{alias}.{id_col} = tg0.{id_col}")
        };
        let indexed_by = if i > 0 {
            index_hint.map(|h| format!(" INDEXED BY {h}")).unwrap_or_default()
        } else {
            String::new()
        };

        let like_conditions = vec![format!("CAST({values_alias}.value AS TEXT) LIKE ? ESCAPE '\\'"); tag.values.len()].join(" OR ");
        sql.push_str(&format!(
            " JOIN {table} AS {alias}{indexed_by} ON {correlation} AND {alias}.tag_name_hash = ? \
              JOIN {values_table} AS {values_alias} ON {values_alias}.hash = {alias}.tag_value_hash \
              AND ({like_conditions})"
        ));

        params.push(Value::Blob(name_hash.as_bytes().to_vec()));
        for value in &tag.values {
            params.push(Value::Text(glob_to_like(value)));
        }
    }

    (sql, params)
}

fn build_exact_joins(source: Source, base_alias: &str, tags: &[TagFilter]) -> (String, Vec<Value>) {
    let ordered = selectivity_ordered(tags);
    let (table, id_col, index_hint) = tag_table(source);
    // `stable_data_items.block_transaction_index` isn't populated by the
    // promotion sweep (see `statements::bundles::INSERT_OR_IGNORE_STABLE_DATA_ITEMS`),
    // so item sources always correlate on the owner-id column directly;
    // only `stable_transactions` carries a real `block_transaction_index`
    // the first tag join can ride for a narrower index.
    let is_stable_tx = matches!(source, Source::StableTx);

    let mut sql = String::new();
    let mut params = Vec::new();

    for (i, tag) in ordered.iter().enumerate() {
        let alias = format!("tg{i}");
        let name_hash = cgw_types::ids::NameHash::of(&tag.name);
        let value_placeholders = vec!["?"; tag.values.len()].join(",");

        let correlation = if i == 0 && is_stable_tx {
            format!(
                "{alias}.height = {base_alias}.height \
                 AND {alias}.block_transaction_index = {base_alias}.block_transaction_index"
            )
        } else if i == 0 {
            format!("{alias}.{id_col} = {base_alias}.id")
        } else {
            // Correlate against the first tag join's owner-id rather than
            // the base table: this is the cross-join-with-hint shape spec
            // §9 calls for, forced via INDEXED BY so the planner can't
            // reorder around a low-selectivity tag.
            format!("{alias}.{id_col} = tg0.{id_col}")
        };

        let indexed_by = if i > 0 {
            index_hint.map(|h| format!(" INDEXED BY {h}")).unwrap_or_default()
        } else {
            String::new()
        };

        sql.push_str(&format!(
            " JOIN {table} AS {alias}{indexed_by} ON {correlation} \
              AND {alias}.tag_name_hash = ? AND {alias}.tag_value_hash IN ({value_placeholders})"
        ));

        params.push(Value::Blob(name_hash.as_bytes().to_vec()));
        for value in &tag.values {
            let value_hash = cgw_types::ids::ValueHash::of(value);
            params.push(Value::Blob(value_hash.as_bytes().to_vec()));
        }
    }

    (sql, params)
}
