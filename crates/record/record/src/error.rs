use syncline_core::{EntityId, EntityKind};

/// Errors from record store operations.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The addressed row does not exist.
    #[error("{kind} record not found: {id}")]
    NotFound { kind: EntityKind, id: EntityId },

    /// The request was malformed before any store was touched.
    #[error("validation error: {0}")]
    Validation(String),

    /// Could not reach the backing store.
    #[error("connection error: {0}")]
    Connection(String),

    /// An error from the underlying storage backend.
    #[error("backend error: {0}")]
    Backend(String),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl RecordError {
    /// Convenience constructor for [`RecordError::NotFound`].
    #[must_use]
    pub fn not_found(kind: EntityKind, id: EntityId) -> Self {
        Self::NotFound { kind, id }
    }
}
