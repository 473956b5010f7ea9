//! Error types shared by the encoding and cursor codecs.

use thiserror::Error;

/// Errors raised while decoding a wire identifier or cursor.
///
/// `CursorInvalid` corresponds to the `cursor-invalid` entry of the error
/// taxonomy: malformed cursors must fail the request rather than silently
/// falling back to a default page.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("invalid base64url encoding: {0}")]
    InvalidBase64(String),

    #[error("expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("cursor-invalid: {0}")]
    CursorInvalid(String),
}
