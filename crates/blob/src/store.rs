use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BlobError;

/// Pluggable blob storage backend for post attachments.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a blob and return its generated name.
    ///
    /// The name is a random 128-bit identifier plus the extension
    /// derived from `original_name` (empty if it has none). Empty
    /// content is rejected with [`BlobError::Empty`] before anything is
    /// written.
    async fn store(&self, data: Bytes, original_name: &str) -> Result<String, BlobError>;

    /// Read a blob back by its stored name.
    ///
    /// Fails with [`BlobError::NotFound`] when the blob does not exist
    /// or is unreadable, and [`BlobError::InvalidName`] when the name
    /// would resolve outside the store.
    async fn load(&self, stored_name: &str) -> Result<Bytes, BlobError>;

    /// Delete a blob. Best-effort: absence is not an error.
    async fn delete(&self, stored_name: &str) -> Result<(), BlobError>;
}
