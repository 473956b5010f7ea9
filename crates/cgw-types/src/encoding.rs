//! URL-safe base64 (no padding) helpers, and the opaque cursor codec.
//!
//! See spec §3 "Identifiers" for the wire-encoding rule and §4.4 "Cursor"
//! for the cursor shape: base64url of a JSON tuple
//! `[height, blockTransactionIndex, dataItemId, indexedAt, id]`.

use crate::errors::EncodingError;
use crate::ids::DataItemId;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

pub fn b64url_encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn b64url_decode(s: &str) -> Result<Vec<u8>, EncodingError> {
    URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|e| EncodingError::InvalidBase64(e.to_string()))
}

/// A paginated query's position, as described in spec §4.4.
///
/// `height` and `block_transaction_index` are `None` for not-yet-linked
/// ("new") rows; `data_item_id` is the bare-tx sentinel for transactions.
/// Total order is `(height, block_transaction_index, data_item_id,
/// indexed_at, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub height: Option<u64>,
    pub block_transaction_index: Option<u32>,
    pub data_item_id: DataItemId,
    pub indexed_at: i64,
    pub id: String,
}

/// The JSON-array wire shape of a cursor, kept separate from `Cursor` so the
/// tuple ordering is the one thing callers must never rely on beyond
/// round-tripping it verbatim (spec §6 "Cursors": "The core MAY change the
/// encoding; callers MUST round-trip cursors unmodified").
#[derive(Serialize, Deserialize)]
struct CursorTuple(
    Option<u64>,
    Option<u32>,
    String, // data_item_id, base64url
    i64,
    String, // id, base64url
);

impl Cursor {
    pub fn encode(&self) -> String {
        let tuple = CursorTuple(
            self.height,
            self.block_transaction_index,
            self.data_item_id.to_base64url(),
            self.indexed_at,
            self.id.clone(),
        );
        let json = serde_json::to_vec(&tuple).expect("cursor tuple is always serializable");
        b64url_encode(&json)
    }

    pub fn decode(s: &str) -> Result<Self, EncodingError> {
        let bytes = b64url_decode(s)?;
        let tuple: CursorTuple = serde_json::from_slice(&bytes)
            .map_err(|e| EncodingError::CursorInvalid(e.to_string()))?;
        let data_item_id = DataItemId::from_base64url(&tuple.2)
            .map_err(|e| EncodingError::CursorInvalid(e.to_string()))?;
        Ok(Cursor {
            height: tuple.0,
            block_transaction_index: tuple.1,
            data_item_id,
            indexed_at: tuple.3,
            id: tuple.4,
        })
    }
}
