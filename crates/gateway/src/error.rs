use syncline_blob::BlobError;
use syncline_index::IndexError;
use syncline_record::RecordError;

/// Errors surfaced to gateway callers.
///
/// There is intentionally no `From<IndexError>`: index failures on the
/// write path are swallowed at the propagation boundary, never
/// propagated, so nothing can accidentally `?` one into a request
/// failure. The [`GatewayError::Search`] variant exists only for the
/// read path, where the mirror is the data source and its errors are
/// real.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A record store failure: fatal to the request.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// A blob store failure: fatal to the request; no file record or
    /// ledger mutation happens after one.
    #[error(transparent)]
    Blob(#[from] BlobError),

    /// A search read against the index mirror failed.
    #[error("search failed: {0}")]
    Search(IndexError),

    /// The request was malformed before any store was touched.
    #[error("validation error: {0}")]
    Validation(String),
}
