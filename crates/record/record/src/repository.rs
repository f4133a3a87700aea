use async_trait::async_trait;

use syncline_core::{Entity, EntityId, Page, PageRequest, Post};

use crate::error::RecordError;

/// Generic per-entity repository over the system of record.
///
/// One trait instead of eleven near-identical ones: backends implement
/// it once per entity kind, and every caller goes through the same
/// surface, so the write pattern cannot drift between kinds.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Persist the entity: insert when `id` is `None` (the store assigns
    /// the id), full update when `id` is `Some`.
    ///
    /// Updating a missing id fails with [`RecordError::NotFound`] and
    /// mutates nothing.
    async fn save(&self, entity: E) -> Result<E, RecordError>;

    /// Fetch one row by id with its to-one associations resolved.
    /// Multi-valued associations come back empty (direct fetch).
    async fn find_by_id(&self, id: EntityId) -> Result<Option<E>, RecordError>;

    /// Fetch one page (direct fetch), applying the request's sort order.
    async fn find_page(&self, page: &PageRequest) -> Result<Page<E>, RecordError>;

    /// Export every row, for reconciliation. No ordering guarantee.
    async fn find_all(&self) -> Result<Vec<E>, RecordError>;

    /// Delete by id. Returns `true` if the row existed.
    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RecordError>;
}

/// Post-specific contract: eager fetches over the multi-valued
/// associations (tags, attached file names) and the attachment ledger.
///
/// Eager fetch is a two-pass plan. Pass one is the paginated direct
/// fetch; pass two batch-loads the multi-valued associations keyed by
/// the ids pass one returned, without re-sorting; the in-memory merge
/// must preserve pass one's ordering exactly. Relational engines reject
/// combining independently-paginated multi-valued joins in one query,
/// which is why the split exists at the trait level.
#[async_trait]
pub trait PostRepository: Repository<Post> {
    /// One post with tags and file names populated.
    async fn find_by_id_eager(&self, id: EntityId) -> Result<Option<Post>, RecordError>;

    /// One page of posts with tags and file names populated.
    async fn find_page_eager(&self, page: &PageRequest) -> Result<Page<Post>, RecordError>;

    /// Posts carrying at least one of the named tags.
    async fn find_by_tags(
        &self,
        tag_names: &[String],
        page: &PageRequest,
    ) -> Result<Page<Post>, RecordError>;

    /// Append stored blob names to the post's attachment list and return
    /// the new count.
    ///
    /// The count is recomputed from the resulting list length, never
    /// incremented, so it cannot drift from the list even if the list
    /// was edited out of band. Fails with [`RecordError::NotFound`] if
    /// the post does not exist; the list is append-only (no removal
    /// operation exists).
    async fn attach_files(
        &self,
        post_id: EntityId,
        stored_names: &[String],
    ) -> Result<i32, RecordError>;
}
