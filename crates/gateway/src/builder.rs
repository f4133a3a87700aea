use std::sync::Arc;

use syncline_blob::BlobStore;
use syncline_core::{
    Comment, Entity, Favorite, FileRecord, Follow, Mention, Notification, Post, Reaction, Share,
    Tag, User,
};
use syncline_index::SearchIndex;
use syncline_record::{PostRepository, Repository};

use crate::error::GatewayError;
use crate::post_service::PostService;
use crate::reindex::{EntityReindexer, ReindexReport, ReindexTarget, Reindexer};
use crate::service::EntityService;

type Pair<E> = (Arc<dyn Repository<E>>, Arc<dyn SearchIndex<E>>);

const DEFAULT_DOWNLOAD_PREFIX: &str = "/api/files/download";

/// The assembled write path: one synchronized service per entity kind,
/// the post/file/blob composite, and the reconciliation job over all of
/// them.
pub struct SyncGateway {
    pub posts: PostService,
    pub comments: EntityService<Comment>,
    pub reactions: EntityService<Reaction>,
    pub shares: EntityService<Share>,
    pub favorites: EntityService<Favorite>,
    pub follows: EntityService<Follow>,
    pub mentions: EntityService<Mention>,
    pub notifications: EntityService<Notification>,
    pub files: EntityService<FileRecord>,
    pub tags: EntityService<Tag>,
    pub users: EntityService<User>,
    reindexer: Reindexer,
}

impl SyncGateway {
    #[must_use]
    pub fn builder() -> SyncGatewayBuilder {
        SyncGatewayBuilder::new()
    }

    /// Operator-triggered bulk repair: upsert every mirror document
    /// from the record store. See [`Reindexer::reindex_all`].
    pub async fn reindex_all(&self) -> Result<ReindexReport, GatewayError> {
        self.reindexer.reindex_all().await
    }

    /// Bulk repair that also prunes documents for deleted ids. See
    /// [`Reindexer::reindex_all_pruning`].
    pub async fn reindex_all_pruning(&self) -> Result<ReindexReport, GatewayError> {
        self.reindexer.reindex_all_pruning().await
    }
}

/// Fluent builder for a [`SyncGateway`].
///
/// Every entity kind needs its (repository, index) pair, and posts need
/// the blob store on top; the download prefix has a sensible default.
pub struct SyncGatewayBuilder {
    posts: Option<(Arc<dyn PostRepository>, Arc<dyn SearchIndex<Post>>)>,
    comments: Option<Pair<Comment>>,
    reactions: Option<Pair<Reaction>>,
    shares: Option<Pair<Share>>,
    favorites: Option<Pair<Favorite>>,
    follows: Option<Pair<Follow>>,
    mentions: Option<Pair<Mention>>,
    notifications: Option<Pair<Notification>>,
    files: Option<Pair<FileRecord>>,
    tags: Option<Pair<Tag>>,
    users: Option<Pair<User>>,
    blobs: Option<Arc<dyn BlobStore>>,
    download_prefix: String,
}

impl SyncGatewayBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            posts: None,
            comments: None,
            reactions: None,
            shares: None,
            favorites: None,
            follows: None,
            mentions: None,
            notifications: None,
            files: None,
            tags: None,
            users: None,
            blobs: None,
            download_prefix: DEFAULT_DOWNLOAD_PREFIX.to_owned(),
        }
    }

    #[must_use]
    pub fn posts(
        mut self,
        repo: Arc<dyn PostRepository>,
        index: Arc<dyn SearchIndex<Post>>,
    ) -> Self {
        self.posts = Some((repo, index));
        self
    }

    #[must_use]
    pub fn comments(
        mut self,
        repo: Arc<dyn Repository<Comment>>,
        index: Arc<dyn SearchIndex<Comment>>,
    ) -> Self {
        self.comments = Some((repo, index));
        self
    }

    #[must_use]
    pub fn reactions(
        mut self,
        repo: Arc<dyn Repository<Reaction>>,
        index: Arc<dyn SearchIndex<Reaction>>,
    ) -> Self {
        self.reactions = Some((repo, index));
        self
    }

    #[must_use]
    pub fn shares(
        mut self,
        repo: Arc<dyn Repository<Share>>,
        index: Arc<dyn SearchIndex<Share>>,
    ) -> Self {
        self.shares = Some((repo, index));
        self
    }

    #[must_use]
    pub fn favorites(
        mut self,
        repo: Arc<dyn Repository<Favorite>>,
        index: Arc<dyn SearchIndex<Favorite>>,
    ) -> Self {
        self.favorites = Some((repo, index));
        self
    }

    #[must_use]
    pub fn follows(
        mut self,
        repo: Arc<dyn Repository<Follow>>,
        index: Arc<dyn SearchIndex<Follow>>,
    ) -> Self {
        self.follows = Some((repo, index));
        self
    }

    #[must_use]
    pub fn mentions(
        mut self,
        repo: Arc<dyn Repository<Mention>>,
        index: Arc<dyn SearchIndex<Mention>>,
    ) -> Self {
        self.mentions = Some((repo, index));
        self
    }

    #[must_use]
    pub fn notifications(
        mut self,
        repo: Arc<dyn Repository<Notification>>,
        index: Arc<dyn SearchIndex<Notification>>,
    ) -> Self {
        self.notifications = Some((repo, index));
        self
    }

    #[must_use]
    pub fn files(
        mut self,
        repo: Arc<dyn Repository<FileRecord>>,
        index: Arc<dyn SearchIndex<FileRecord>>,
    ) -> Self {
        self.files = Some((repo, index));
        self
    }

    #[must_use]
    pub fn tags(
        mut self,
        repo: Arc<dyn Repository<Tag>>,
        index: Arc<dyn SearchIndex<Tag>>,
    ) -> Self {
        self.tags = Some((repo, index));
        self
    }

    #[must_use]
    pub fn users(
        mut self,
        repo: Arc<dyn Repository<User>>,
        index: Arc<dyn SearchIndex<User>>,
    ) -> Self {
        self.users = Some((repo, index));
        self
    }

    /// Set the blob store backing post attachments.
    #[must_use]
    pub fn blobs(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(store);
        self
    }

    /// Override the path prefix used when building file download URLs.
    #[must_use]
    pub fn download_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.download_prefix = prefix.into();
        self
    }

    /// Assemble the gateway, failing with a validation error if any
    /// wiring is missing.
    pub fn build(self) -> Result<SyncGateway, GatewayError> {
        let mut targets: Vec<Arc<dyn ReindexTarget>> = Vec::new();

        let (post_repo, post_index) = self
            .posts
            .ok_or_else(|| missing("posts"))?;
        // Posts reconcile through the same generic target as every
        // other kind; find_all on the post repository already exports
        // the eager projection.
        let post_record_repo: Arc<dyn Repository<Post>> =
            Arc::clone(&post_repo) as Arc<dyn Repository<Post>>;
        targets.push(Arc::new(EntityReindexer::new(
            post_record_repo,
            Arc::clone(&post_index),
        )));

        let files = wire(self.files, "files", &mut targets)?;
        let posts = PostService::new(
            post_repo,
            post_index,
            files.clone(),
            self.blobs.ok_or_else(|| missing("blob store"))?,
            self.download_prefix,
        );

        let gateway = SyncGateway {
            posts,
            comments: wire(self.comments, "comments", &mut targets)?,
            reactions: wire(self.reactions, "reactions", &mut targets)?,
            shares: wire(self.shares, "shares", &mut targets)?,
            favorites: wire(self.favorites, "favorites", &mut targets)?,
            follows: wire(self.follows, "follows", &mut targets)?,
            mentions: wire(self.mentions, "mentions", &mut targets)?,
            notifications: wire(self.notifications, "notifications", &mut targets)?,
            files,
            tags: wire(self.tags, "tags", &mut targets)?,
            users: wire(self.users, "users", &mut targets)?,
            reindexer: Reindexer::new(targets),
        };
        Ok(gateway)
    }
}

impl Default for SyncGatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn missing(what: &str) -> GatewayError {
    GatewayError::Validation(format!("gateway builder: missing {what} wiring"))
}

/// Turn one wiring pair into its service, registering its reindex
/// target on the way.
fn wire<E: Entity>(
    pair: Option<Pair<E>>,
    name: &str,
    targets: &mut Vec<Arc<dyn ReindexTarget>>,
) -> Result<EntityService<E>, GatewayError> {
    let (repo, index) = pair.ok_or_else(|| missing(name))?;
    targets.push(Arc::new(EntityReindexer::new(
        Arc::clone(&repo),
        Arc::clone(&index),
    )));
    Ok(EntityService::new(repo, index))
}
