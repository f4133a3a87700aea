//! Shared fixtures for the gateway integration tests: an in-memory
//! gateway wired across every entity kind, with failure-injectable
//! indexes for the post and comment mirrors.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use syncline_blob::{LocalBlobStore, StorageConfig};
use syncline_core::{
    Comment, Entity, EntityId, FileRecord, Favorite, Follow, Mention, Notification, Page,
    PageRequest, Post, Reaction, Share, Tag, User,
};
use syncline_gateway::SyncGateway;
use syncline_index::{IndexError, SearchIndex};
use syncline_index_memory::MemorySearchIndex;
use syncline_record_memory::MemoryRecordStore;

/// A real in-memory index with switchable failure injection on the
/// write-side operations, for simulating mirror outages.
pub struct FlakyIndex<D: Entity> {
    inner: MemorySearchIndex<D>,
    fail_index: AtomicBool,
    fail_delete: AtomicBool,
}

impl<D: Entity> FlakyIndex<D> {
    pub fn new() -> Self {
        Self {
            inner: MemorySearchIndex::new(),
            fail_index: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
        }
    }

    pub fn fail_index(&self, fail: bool) {
        self.fail_index.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.inner.ids()
    }
}

#[async_trait]
impl<D: Entity> SearchIndex<D> for FlakyIndex<D> {
    async fn search(&self, query: &str, page: &PageRequest) -> Result<Page<D>, IndexError> {
        self.inner.search(query, page).await
    }

    async fn index(&self, doc: &D) -> Result<(), IndexError> {
        if self.fail_index.load(Ordering::SeqCst) {
            return Err(IndexError::Storage("simulated index outage".to_owned()));
        }
        self.inner.index(doc).await
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<(), IndexError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(IndexError::Storage("simulated index outage".to_owned()));
        }
        self.inner.delete_by_id(id).await
    }
}

/// Everything a test needs: the gateway plus handles onto the backing
/// stores for direct inspection.
pub struct TestContext {
    pub gateway: SyncGateway,
    pub records: MemoryRecordStore,
    pub post_index: Arc<FlakyIndex<Post>>,
    pub comment_index: Arc<FlakyIndex<Comment>>,
    pub file_index: Arc<MemorySearchIndex<FileRecord>>,
    _blob_dir: tempfile::TempDir,
}

/// Build a fully wired in-memory gateway.
pub async fn build_gateway() -> TestContext {
    let records = MemoryRecordStore::new();
    let post_index = Arc::new(FlakyIndex::<Post>::new());
    let comment_index = Arc::new(FlakyIndex::<Comment>::new());
    let file_index = Arc::new(MemorySearchIndex::<FileRecord>::new());

    let blob_dir = tempfile::tempdir().expect("tempdir");
    let blobs = Arc::new(
        LocalBlobStore::new(&StorageConfig::new(blob_dir.path()))
            .await
            .expect("blob store"),
    );

    let gateway = SyncGateway::builder()
        .posts(records.posts(), post_index.clone())
        .comments(records.comments(), comment_index.clone())
        .reactions(records.reactions(), Arc::new(MemorySearchIndex::<Reaction>::new()))
        .shares(records.shares(), Arc::new(MemorySearchIndex::<Share>::new()))
        .favorites(records.favorites(), Arc::new(MemorySearchIndex::<Favorite>::new()))
        .follows(records.follows(), Arc::new(MemorySearchIndex::<Follow>::new()))
        .mentions(records.mentions(), Arc::new(MemorySearchIndex::<Mention>::new()))
        .notifications(
            records.notifications(),
            Arc::new(MemorySearchIndex::<Notification>::new()),
        )
        .files(records.files(), file_index.clone())
        .tags(records.tags(), Arc::new(MemorySearchIndex::<Tag>::new()))
        .users(records.users(), Arc::new(MemorySearchIndex::<User>::new()))
        .blobs(blobs)
        .build()
        .expect("gateway wiring");

    TestContext {
        gateway,
        records,
        post_index,
        comment_index,
        file_index,
        _blob_dir: blob_dir,
    }
}
