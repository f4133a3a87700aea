use std::sync::Arc;

use async_trait::async_trait;

use syncline_core::{
    Comment, EntityId, EntityKind, Favorite, FileRecord, Follow, Mention, Notification, Page,
    PageRequest, Post, Reaction, Share, Tag, User,
};
use syncline_record::{PostRepository, RecordError, Repository};

use crate::table::MemoryTable;

/// Post rows with the multi-valued associations handled the way a
/// relational backend would: direct fetches strip tags and file names,
/// eager fetches run the two-pass hydrate, and the attachment list is
/// append-only with its count recomputed from the list length.
#[derive(Debug, Default)]
pub struct MemoryPostStore {
    table: MemoryTable<Post>,
}

impl MemoryPostStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct-fetch projection: multi-valued associations stripped, the
    /// cached count kept (it is a scalar column).
    fn strip(mut post: Post) -> Post {
        post.tags.clear();
        post.files.clear();
        post
    }

    /// Pass two of the eager plan: batch-load associations for the rows
    /// pass one returned and merge them back in, preserving pass one's
    /// ordering exactly (the merge keys by id and never re-sorts).
    fn hydrate(&self, posts: Vec<Post>) -> Vec<Post> {
        posts
            .into_iter()
            .map(|mut post| {
                if let Some(full) = post.id.and_then(|id| self.table.get(id)) {
                    post.tags = full.tags;
                    post.files = full.files;
                    post.num_files = full.num_files;
                }
                post
            })
            .collect()
    }
}

#[async_trait]
impl Repository<Post> for MemoryPostStore {
    async fn save(&self, mut entity: Post) -> Result<Post, RecordError> {
        match entity.id {
            None => {
                entity.num_files = i32::try_from(entity.files.len()).unwrap_or(i32::MAX);
                self.table.save(entity).await
            }
            Some(id) => {
                // The attachment list is owned by the ledger: a full
                // update replaces every scalar and the tag set but
                // leaves the stored file list untouched.
                let existing = self
                    .table
                    .get(id)
                    .ok_or_else(|| RecordError::not_found(EntityKind::Post, id))?;
                entity.files = existing.files;
                entity.num_files = existing.num_files;
                self.table.save(entity).await
            }
        }
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Post>, RecordError> {
        Ok(self.table.get(id).map(Self::strip))
    }

    async fn find_page(&self, page: &PageRequest) -> Result<Page<Post>, RecordError> {
        let direct = MemoryTable::paginate(self.table.snapshot(), page);
        Ok(direct.map(Self::strip))
    }

    async fn find_all(&self) -> Result<Vec<Post>, RecordError> {
        // Reconciliation export: full denormalized rows, since the
        // search documents must be self-contained.
        Ok(self.table.snapshot())
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RecordError> {
        self.table.delete_by_id(id).await
    }
}

#[async_trait]
impl PostRepository for MemoryPostStore {
    async fn find_by_id_eager(&self, id: EntityId) -> Result<Option<Post>, RecordError> {
        Ok(self.table.get(id))
    }

    async fn find_page_eager(&self, page: &PageRequest) -> Result<Page<Post>, RecordError> {
        // Pass one: paginated direct fetch. Pass two: hydrate in order.
        let direct = self.find_page(page).await?;
        let items = self.hydrate(direct.items);
        Ok(Page {
            items,
            total: direct.total,
            page: direct.page,
            size: direct.size,
        })
    }

    async fn find_by_tags(
        &self,
        tag_names: &[String],
        page: &PageRequest,
    ) -> Result<Page<Post>, RecordError> {
        let matching: Vec<Post> = self
            .table
            .snapshot()
            .into_iter()
            .filter(|post| post.tags.iter().any(|tag| tag_names.contains(&tag.name)))
            .collect();
        Ok(MemoryTable::paginate(matching, page))
    }

    async fn attach_files(
        &self,
        post_id: EntityId,
        stored_names: &[String],
    ) -> Result<i32, RecordError> {
        self.table
            .with_row_mut(post_id, |post| {
                post.files.extend(stored_names.iter().cloned());
                post.num_files = i32::try_from(post.files.len()).unwrap_or(i32::MAX);
                post.num_files
            })
            .ok_or_else(|| RecordError::not_found(EntityKind::Post, post_id))
    }
}

/// The full in-memory system of record: one table per entity kind.
///
/// Accessors hand out `Arc` clones so each table can serve as a
/// `dyn Repository<E>` trait object independently.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    posts: Arc<MemoryPostStore>,
    comments: Arc<MemoryTable<Comment>>,
    reactions: Arc<MemoryTable<Reaction>>,
    shares: Arc<MemoryTable<Share>>,
    favorites: Arc<MemoryTable<Favorite>>,
    follows: Arc<MemoryTable<Follow>>,
    mentions: Arc<MemoryTable<Mention>>,
    notifications: Arc<MemoryTable<Notification>>,
    files: Arc<MemoryTable<FileRecord>>,
    tags: Arc<MemoryTable<Tag>>,
    users: Arc<MemoryTable<User>>,
}

impl MemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn posts(&self) -> Arc<MemoryPostStore> {
        Arc::clone(&self.posts)
    }

    #[must_use]
    pub fn comments(&self) -> Arc<MemoryTable<Comment>> {
        Arc::clone(&self.comments)
    }

    #[must_use]
    pub fn reactions(&self) -> Arc<MemoryTable<Reaction>> {
        Arc::clone(&self.reactions)
    }

    #[must_use]
    pub fn shares(&self) -> Arc<MemoryTable<Share>> {
        Arc::clone(&self.shares)
    }

    #[must_use]
    pub fn favorites(&self) -> Arc<MemoryTable<Favorite>> {
        Arc::clone(&self.favorites)
    }

    #[must_use]
    pub fn follows(&self) -> Arc<MemoryTable<Follow>> {
        Arc::clone(&self.follows)
    }

    #[must_use]
    pub fn mentions(&self) -> Arc<MemoryTable<Mention>> {
        Arc::clone(&self.mentions)
    }

    #[must_use]
    pub fn notifications(&self) -> Arc<MemoryTable<Notification>> {
        Arc::clone(&self.notifications)
    }

    #[must_use]
    pub fn files(&self) -> Arc<MemoryTable<FileRecord>> {
        Arc::clone(&self.files)
    }

    #[must_use]
    pub fn tags(&self) -> Arc<MemoryTable<Tag>> {
        Arc::clone(&self.tags)
    }

    #[must_use]
    pub fn users(&self) -> Arc<MemoryTable<User>> {
        Arc::clone(&self.users)
    }
}

#[cfg(test)]
mod tests {
    use syncline_core::{PageRequest, Post, Privacy, SortClause, TagRef};
    use syncline_record::{PostRepository, Repository};

    use super::MemoryPostStore;

    fn post(content: &str, tags: &[&str]) -> Post {
        let mut post = Post::new(content, Privacy::Public);
        post.tags = tags
            .iter()
            .enumerate()
            .map(|(n, name)| TagRef::new(n as i64 + 1, *name))
            .collect();
        post
    }

    #[tokio::test]
    async fn direct_fetch_strips_associations() {
        let store = MemoryPostStore::new();
        let saved = store.save(post("hello", &["travel"])).await.unwrap();
        let id = saved.id.unwrap();

        let direct = store.find_by_id(id).await.unwrap().unwrap();
        assert!(direct.tags.is_empty());

        let eager = store.find_by_id_eager(id).await.unwrap().unwrap();
        assert_eq!(eager.tags.len(), 1);
    }

    #[tokio::test]
    async fn eager_page_preserves_pass_one_ordering() {
        let store = MemoryPostStore::new();
        for (content, tags) in [("c", &["x"][..]), ("a", &[][..]), ("b", &["y", "z"][..])] {
            store.save(post(content, tags)).await.unwrap();
        }

        let page = store
            .find_page_eager(&PageRequest::of(0, 10).sorted_by(SortClause::asc("content")))
            .await
            .unwrap();

        let contents: Vec<&str> = page.items.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "b", "c"], "merge must keep sort order");
        assert!(page.items[0].tags.is_empty());
        assert_eq!(page.items[1].tags.len(), 2);
        assert_eq!(page.items[2].tags.len(), 1);
    }

    #[tokio::test]
    async fn attach_recomputes_count_every_call() {
        let store = MemoryPostStore::new();
        let saved = store.save(post("p", &[])).await.unwrap();
        let id = saved.id.unwrap();

        let count = store
            .attach_files(id, &["a.png".into(), "b.txt".into()])
            .await
            .unwrap();
        assert_eq!(count, 2);

        let count = store.attach_files(id, &["c.pdf".into()]).await.unwrap();
        assert_eq!(count, 3);

        let eager = store.find_by_id_eager(id).await.unwrap().unwrap();
        assert_eq!(eager.files.len(), eager.num_files as usize);
        assert_eq!(eager.files, vec!["a.png", "b.txt", "c.pdf"]);
    }

    #[tokio::test]
    async fn attach_on_missing_post_is_not_found() {
        let store = MemoryPostStore::new();
        let result = store
            .attach_files(syncline_core::EntityId(404), &["x.bin".into()])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn update_preserves_attachment_ledger() {
        let store = MemoryPostStore::new();
        let saved = store.save(post("p", &[])).await.unwrap();
        let id = saved.id.unwrap();
        store.attach_files(id, &["a.png".into()]).await.unwrap();

        // A full update carries empty associations (direct projection).
        let mut update = saved;
        update.content = "edited".into();
        store.save(update).await.unwrap();

        let eager = store.find_by_id_eager(id).await.unwrap().unwrap();
        assert_eq!(eager.content, "edited");
        assert_eq!(eager.files, vec!["a.png"], "ledger must survive updates");
        assert_eq!(eager.num_files, 1);
    }

    #[tokio::test]
    async fn find_by_tags_matches_any_listed_name() {
        let store = MemoryPostStore::new();
        store.save(post("one", &["travel"])).await.unwrap();
        store.save(post("two", &["food"])).await.unwrap();
        store.save(post("three", &[])).await.unwrap();

        let page = store
            .find_by_tags(&["travel".into(), "food".into()], &PageRequest::of(0, 10))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }
}
