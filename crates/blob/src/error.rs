use thiserror::Error;

/// Errors from blob storage operations.
#[derive(Debug, Error)]
pub enum BlobError {
    /// Rejected before any write: uploads must carry content.
    #[error("cannot store an empty blob")]
    Empty,

    /// The stored name is not a plain file name (path separators or
    /// parent-directory segments would escape the root).
    #[error("invalid blob name: {0}")]
    InvalidName(String),

    /// The named blob does not exist or cannot be read.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// A storage backend error occurred.
    #[error("blob storage error: {0}")]
    Storage(String),
}
