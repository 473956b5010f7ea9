//! Identifiers, domain entities, constants, and the cursor/base64 codec
//! shared across the chain gateway index workspace.

pub mod constants;
pub mod encoding;
pub mod entities;
pub mod errors;
pub mod ids;

pub use encoding::{b64url_decode, b64url_encode, Cursor};
pub use errors::EncodingError;
pub use ids::{
    BlockId, ContentHash, DataItemId, DataRoot, NameHash, TxId, ValueHash, WalletAddress,
    BARE_TX_DATA_ITEM_ID,
};
