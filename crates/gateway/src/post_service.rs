use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, warn};

use syncline_blob::BlobStore;
use syncline_core::{Entity, EntityId, FileRecord, Page, PageRequest, Post, PostPatch};
use syncline_index::SearchIndex;
use syncline_record::PostRepository;

use crate::error::GatewayError;
use crate::service::EntityService;

/// One file in an upload request: the caller-supplied name and type
/// plus the raw bytes.
#[derive(Debug, Clone)]
pub struct Upload {
    pub original_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl Upload {
    #[must_use]
    pub fn new(original_name: impl Into<String>, data: Bytes) -> Self {
        Self {
            original_name: original_name.into(),
            content_type: None,
            data,
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// The post write path: the generic synchronized write plus everything
/// posts add on top (eager reads, tag queries, the blob store, and the
/// attachment ledger).
///
/// Unlike the generic service, post propagation indexes the *eager*
/// projection (reloaded by id after the commit), so the mirror document
/// always carries the denormalized tag names and file list.
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    index: Arc<dyn SearchIndex<Post>>,
    files: EntityService<FileRecord>,
    blobs: Arc<dyn BlobStore>,
    download_prefix: String,
}

impl PostService {
    #[must_use]
    pub fn new(
        posts: Arc<dyn PostRepository>,
        index: Arc<dyn SearchIndex<Post>>,
        files: EntityService<FileRecord>,
        blobs: Arc<dyn BlobStore>,
        download_prefix: impl Into<String>,
    ) -> Self {
        Self {
            posts,
            index,
            files,
            blobs,
            download_prefix: download_prefix.into(),
        }
    }

    /// Create or fully update a post, then propagate its eager
    /// projection to the mirror.
    pub async fn save(&self, post: Post) -> Result<Post, GatewayError> {
        debug!("request to save post");
        let saved = self.posts.save(post).await?;
        self.propagate(&saved).await;
        Ok(saved)
    }

    /// Full update of an existing post.
    pub async fn update(&self, post: Post) -> Result<Post, GatewayError> {
        if post.id.is_none() {
            return Err(GatewayError::Validation(
                "update requires an id".to_owned(),
            ));
        }
        self.save(post).await
    }

    /// Merge-patch an existing post. Returns `None` when the id is
    /// unknown.
    pub async fn partial_update(
        &self,
        id: EntityId,
        patch: PostPatch,
    ) -> Result<Option<Post>, GatewayError> {
        debug!(%id, "request to partially update post");
        let Some(mut existing) = self.posts.find_by_id(id).await? else {
            return Ok(None);
        };
        existing.merge(patch);
        let saved = self.posts.save(existing).await?;
        self.propagate(&saved).await;
        Ok(Some(saved))
    }

    /// One post with its associations resolved.
    pub async fn find_one(&self, id: EntityId) -> Result<Option<Post>, GatewayError> {
        Ok(self.posts.find_by_id_eager(id).await?)
    }

    /// One page, scalar fields and to-one associations only.
    pub async fn find_page(&self, page: &PageRequest) -> Result<Page<Post>, GatewayError> {
        Ok(self.posts.find_page(page).await?)
    }

    /// One page with tags and file names populated via the two-pass
    /// plan.
    pub async fn find_page_eager(&self, page: &PageRequest) -> Result<Page<Post>, GatewayError> {
        Ok(self.posts.find_page_eager(page).await?)
    }

    /// Posts carrying at least one of the named tags.
    pub async fn find_by_tags(
        &self,
        tag_names: &[String],
        page: &PageRequest,
    ) -> Result<Page<Post>, GatewayError> {
        Ok(self.posts.find_by_tags(tag_names, page).await?)
    }

    /// Delete from the record store first, then from the mirror.
    pub async fn delete(&self, id: EntityId) -> Result<bool, GatewayError> {
        debug!(%id, "request to delete post");
        let existed = self.posts.delete_by_id(id).await?;
        if let Err(e) = self.index.delete_by_id(id).await {
            warn!(%id, error = %e, "index delete propagation failed; stale document remains");
        }
        Ok(existed)
    }

    /// Evaluate a search query against the post mirror.
    pub async fn search(
        &self,
        query: &str,
        page: &PageRequest,
    ) -> Result<Page<Post>, GatewayError> {
        debug!(query, "request to search posts");
        self.index
            .search(query, page)
            .await
            .map_err(GatewayError::Search)
    }

    /// Store uploaded files for an existing post.
    ///
    /// Each upload goes to the blob store (empty content is rejected
    /// there, before anything else happens), then ONE ledger `attach`
    /// appends all stored names in order, then one file record per blob
    /// is persisted through the synchronized file service and returned
    /// with its download URL.
    ///
    /// A blob store failure aborts the whole request: no ledger
    /// mutation and no file records are made after one.
    pub async fn store_files_for_post(
        &self,
        post_id: EntityId,
        uploads: Vec<Upload>,
    ) -> Result<Vec<FileRecord>, GatewayError> {
        debug!(%post_id, count = uploads.len(), "request to store files for post");

        let mut stored_names = Vec::with_capacity(uploads.len());
        for upload in &uploads {
            let name = self
                .blobs
                .store(upload.data.clone(), &upload.original_name)
                .await?;
            stored_names.push(name);
        }

        let count = self.posts.attach_files(post_id, &stored_names).await?;
        debug!(%post_id, count, "attachments recorded");

        let mut records = Vec::with_capacity(stored_names.len());
        for (upload, name) in uploads.iter().zip(&stored_names) {
            let record = FileRecord {
                id: None,
                file_name: name.clone(),
                file_url: format!("{}/{name}", self.download_prefix.trim_end_matches('/')),
                mime_type: upload
                    .content_type
                    .clone()
                    .unwrap_or_else(|| "application/octet-stream".to_owned()),
                file_size: upload.data.len() as i64,
                uploaded_at: Utc::now(),
                post_id: Some(post_id),
            };
            records.push(self.files.save(record).await?);
        }
        Ok(records)
    }

    /// Create a post and its attachments in one request, returning the
    /// eagerly reloaded result.
    pub async fn save_with_files(
        &self,
        post: Post,
        uploads: Vec<Upload>,
    ) -> Result<Post, GatewayError> {
        let saved = self.save(post).await?;
        let Some(id) = saved.id else {
            return Ok(saved);
        };
        if !uploads.is_empty() {
            self.store_files_for_post(id, uploads).await?;
        }
        Ok(self.posts.find_by_id_eager(id).await?.unwrap_or(saved))
    }

    /// Read a stored blob back, for download requests.
    pub async fn load_file(&self, stored_name: &str) -> Result<Bytes, GatewayError> {
        Ok(self.blobs.load(stored_name).await?)
    }

    /// Post propagation indexes the eager projection, reloaded by id,
    /// so the mirror document carries tags and file names. Failures are
    /// logged and swallowed like every propagation.
    async fn propagate(&self, post: &Post) {
        let Some(id) = post.id else { return };
        match self.posts.find_by_id_eager(id).await {
            Ok(Some(full)) => {
                if let Err(e) = self.index.index(&full).await {
                    warn!(%id, error = %e, "index propagation failed; mirror stale until next write or reindex");
                }
            }
            // Deleted between commit and propagation; nothing to index.
            Ok(None) => {}
            Err(e) => {
                warn!(%id, error = %e, "could not reload post for indexing; mirror stale");
            }
        }
    }
}
