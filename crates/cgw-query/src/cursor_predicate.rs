//! Cursor-to-WHERE-clause translation, spec §4.4 "Cursor predicates and
//! ordering".

use cgw_types::encoding::{b64url_decode, Cursor};
use cgw_types::errors::EncodingError;
use rusqlite::types::Value;

/// Builds the strict lexicographic `col1 op ? OR (col1 = ? AND (...))`
/// predicate over an ordered list of (column expression, bound value)
/// pairs, most significant first. `op` is `<` or `>`.
fn lexicographic(levels: &[(String, Value)], op: &str) -> (String, Vec<Value>) {
    if levels.len() == 1 {
        let (col, val) = &levels[0];
        return (format!("{col} {op} ?"), vec![val.clone()]);
    }
    let (col, val) = &levels[0];
    let (rest_sql, rest_params) = lexicographic(&levels[1..], op);
    let sql = format!("(({col} {op} ?) OR ({col} = ? AND ({rest_sql})))");
    let mut params = vec![val.clone(), val.clone()];
    params.extend(rest_params);
    (sql, params)
}

/// One column's alias-qualified SQL names for the columns the total order is
/// built from, per source (spec §4.4 "Four sources").
pub struct CursorColumns {
    pub height: String,
    pub block_transaction_index: String,
    pub data_item_id: String,
    pub indexed_at: String,
    pub id: String,
}

/// Builds the cursor continuation predicate for one source. Returns `None`
/// when the cursor's NULL-height branch doesn't apply to this source (spec:
/// "stable sources are unaffected by this branch").
pub fn build_predicate(
    cursor: &Cursor,
    ascending: bool,
    source_is_new: bool,
    cols: &CursorColumns,
) -> Result<Option<(String, Vec<Value>)>, EncodingError> {
    let op = if ascending { ">" } else { "<" };

    match cursor.height {
        None => {
            if !source_is_new {
                return Ok(None);
            }
            let sql = format!(
                "({h} IS NULL AND (({idx} {op} ?) OR ({idx} = ? AND {id} {op} ?)))",
                h = cols.height,
                idx = cols.indexed_at,
                id = cols.id,
            );
            let indexed_at_value = Value::Integer(cursor.indexed_at);
            // `cols.id` is the raw-bytes BLOB column; a stored BLOB always
            // sorts greater than any bound TEXT, so the bound value must be
            // the decoded bytes, not the base64url text, to match.
            let id_value = Value::Blob(b64url_decode(&cursor.id)?);
            Ok(Some((sql, vec![indexed_at_value.clone(), indexed_at_value, id_value])))
        }
        Some(height) => {
            let mut levels = vec![(cols.height.clone(), Value::Integer(height as i64))];
            if let Some(bti) = cursor.block_transaction_index {
                levels.push((cols.block_transaction_index.clone(), Value::Integer(bti as i64)));
            }
            levels.push((
                cols.data_item_id.clone(),
                Value::Blob(cursor.data_item_id.as_bytes().to_vec()),
            ));
            Ok(Some(lexicographic(&levels, op)))
        }
    }
}

/// The `ORDER BY` clause mirroring the cursor tuple, with `NULLS FIRST`/
/// `NULLS LAST` matching the sort direction (spec §4.4: "NULL heights sort
/// FIRST in descending and LAST in ascending").
pub fn order_by_clause(ascending: bool, cols: &CursorColumns) -> String {
    let dir = if ascending { "ASC" } else { "DESC" };
    let nulls = if ascending { "NULLS LAST" } else { "NULLS FIRST" };
    format!(
        "ORDER BY {h} {dir} {nulls}, {bti} {dir}, {dii} {dir}, {idx} {dir}, {id} {dir}",
        h = cols.height,
        bti = cols.block_transaction_index,
        dii = cols.data_item_id,
        idx = cols.indexed_at,
        id = cols.id,
    )
}
