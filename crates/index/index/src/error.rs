/// Errors from search index operations.
///
/// These are never fatal to a write request: the gateway logs and
/// swallows them after the record store has committed.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The query expression could not be parsed.
    #[error("query parse error: {0}")]
    Query(String),

    /// An error from the underlying index backend.
    #[error("storage error: {0}")]
    Storage(String),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}
