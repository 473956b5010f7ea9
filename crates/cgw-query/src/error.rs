use thiserror::Error;

/// Errors the query planner surfaces to a caller.
///
/// `CursorInvalid` is the `cursor-invalid` taxonomy entry (spec §7): an
/// ill-formed cursor fails the request rather than silently falling back to
/// an unpaginated query.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("cursor-invalid: {0}")]
    CursorInvalid(#[from] cgw_types::EncodingError),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
