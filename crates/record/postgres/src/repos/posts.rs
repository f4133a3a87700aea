use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};

use syncline_core::{EntityId, EntityKind, Page, PageRequest, Post, Privacy, TagRef};
use syncline_record::{PostRepository, RecordError, Repository};

use super::user_ref;
use crate::store::{PostgresRecordStore, backend_err, order_by};

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    location_name: Option<String>,
    location_lat: Option<f64>,
    location_long: Option<f64>,
    privacy: String,
    scheduled_at: Option<DateTime<Utc>>,
    view_count: i64,
    comment_count: i64,
    share_count: i64,
    reaction_count: i64,
    num_files: i32,
    user_id: Option<i64>,
    user_login: Option<String>,
}

impl TryFrom<PostRow> for Post {
    type Error = RecordError;

    fn try_from(row: PostRow) -> Result<Self, RecordError> {
        Ok(Self {
            id: Some(EntityId(row.id)),
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
            location_name: row.location_name,
            location_lat: row.location_lat,
            location_long: row.location_long,
            privacy: Privacy::from_str(&row.privacy).map_err(RecordError::Serialization)?,
            scheduled_at: row.scheduled_at,
            view_count: row.view_count,
            comment_count: row.comment_count,
            share_count: row.share_count,
            reaction_count: row.reaction_count,
            user: user_ref(row.user_id, row.user_login),
            tags: Vec::new(),
            files: Vec::new(),
            num_files: row.num_files,
        })
    }
}

/// Pass-one select list: scalar columns plus the to-one user join. Safe
/// to combine with pagination because no multi-valued join is present.
const SELECT: &str = "SELECT p.id, p.content, p.created_at, p.updated_at, p.location_name, \
     p.location_lat, p.location_long, p.privacy, p.scheduled_at, p.view_count, \
     p.comment_count, p.share_count, p.reaction_count, p.num_files, \
     p.user_id, u.login AS user_login \
     FROM posts p LEFT JOIN users u ON u.id = p.user_id";

const TAG_FILTER: &str = "EXISTS (SELECT 1 FROM post_tags pt JOIN tags t ON t.id = pt.tag_id \
     WHERE pt.post_id = p.id AND t.name = ANY($1))";

impl PostgresRecordStore {
    /// Pass two (tags): batch load for the given post ids, unsorted.
    async fn load_tags(&self, ids: &[i64]) -> Result<HashMap<i64, Vec<TagRef>>, RecordError> {
        let rows: Vec<(i64, i64, String)> = sqlx::query_as(
            "SELECT pt.post_id, t.id, t.name FROM post_tags pt \
             JOIN tags t ON t.id = pt.tag_id WHERE pt.post_id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(self.pool())
        .await
        .map_err(backend_err)?;

        let mut by_post: HashMap<i64, Vec<TagRef>> = HashMap::new();
        for (post_id, tag_id, name) in rows {
            by_post
                .entry(post_id)
                .or_default()
                .push(TagRef::new(EntityId(tag_id), name));
        }
        Ok(by_post)
    }

    /// Pass two (attachment ledger): batch load file names in ledger
    /// order for the given post ids.
    async fn load_files(&self, ids: &[i64]) -> Result<HashMap<i64, Vec<String>>, RecordError> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT post_id, file_name FROM post_files \
             WHERE post_id = ANY($1) ORDER BY post_id, position",
        )
        .bind(ids)
        .fetch_all(self.pool())
        .await
        .map_err(backend_err)?;

        let mut by_post: HashMap<i64, Vec<String>> = HashMap::new();
        for (post_id, file_name) in rows {
            by_post.entry(post_id).or_default().push(file_name);
        }
        Ok(by_post)
    }

    /// Merge pass-two results into pass-one rows.
    ///
    /// The iteration runs over the pass-one vector, so its ordering
    /// (including any pagination sort) is preserved exactly; the
    /// association maps are only probed by id.
    async fn hydrate_posts(&self, posts: Vec<Post>) -> Result<Vec<Post>, RecordError> {
        if posts.is_empty() {
            return Ok(posts);
        }
        let ids: Vec<i64> = posts.iter().filter_map(|p| p.id.map(EntityId::value)).collect();
        let mut tags = self.load_tags(&ids).await?;
        let mut files = self.load_files(&ids).await?;

        Ok(posts
            .into_iter()
            .map(|mut post| {
                if let Some(id) = post.id.map(EntityId::value) {
                    post.tags = tags.remove(&id).unwrap_or_default();
                    post.files = files.remove(&id).unwrap_or_default();
                }
                post
            })
            .collect())
    }

    /// Replace the post's tag links inside the surrounding transaction.
    async fn replace_tags(
        tx: &mut Transaction<'_, Postgres>,
        post_id: i64,
        tags: &[TagRef],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut **tx)
            .await?;
        for tag in tags {
            sqlx::query(
                "INSERT INTO post_tags (post_id, tag_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(post_id)
            .bind(tag.id.value())
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Repository<Post> for PostgresRecordStore {
    async fn save(&self, mut entity: Post) -> Result<Post, RecordError> {
        let user_id = entity.user.as_ref().map(|u| u.id.value());
        let mut tx = self.pool().begin().await.map_err(backend_err)?;

        match entity.id {
            None => {
                entity.num_files = i32::try_from(entity.files.len()).unwrap_or(i32::MAX);
                let (id,): (i64,) = sqlx::query_as(
                    "INSERT INTO posts (content, created_at, updated_at, location_name, \
                     location_lat, location_long, privacy, scheduled_at, view_count, \
                     comment_count, share_count, reaction_count, user_id, num_files) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
                     RETURNING id",
                )
                .bind(&entity.content)
                .bind(entity.created_at)
                .bind(entity.updated_at)
                .bind(&entity.location_name)
                .bind(entity.location_lat)
                .bind(entity.location_long)
                .bind(entity.privacy.as_str())
                .bind(entity.scheduled_at)
                .bind(entity.view_count)
                .bind(entity.comment_count)
                .bind(entity.share_count)
                .bind(entity.reaction_count)
                .bind(user_id)
                .bind(entity.num_files)
                .fetch_one(&mut *tx)
                .await
                .map_err(backend_err)?;

                Self::replace_tags(&mut tx, id, &entity.tags)
                    .await
                    .map_err(backend_err)?;
                for (position, name) in entity.files.iter().enumerate() {
                    sqlx::query(
                        "INSERT INTO post_files (post_id, position, file_name) \
                         VALUES ($1, $2, $3)",
                    )
                    .bind(id)
                    .bind(i32::try_from(position).unwrap_or(i32::MAX))
                    .bind(name)
                    .execute(&mut *tx)
                    .await
                    .map_err(backend_err)?;
                }

                tx.commit().await.map_err(backend_err)?;
                entity.id = Some(EntityId(id));
                Ok(entity)
            }
            Some(id) => {
                // The attachment ledger is append-only through
                // `attach_files`; a full update never touches
                // `post_files` or `num_files`.
                let result = sqlx::query(
                    "UPDATE posts SET content = $1, updated_at = $2, location_name = $3, \
                     location_lat = $4, location_long = $5, privacy = $6, scheduled_at = $7, \
                     view_count = $8, comment_count = $9, share_count = $10, \
                     reaction_count = $11, user_id = $12 WHERE id = $13",
                )
                .bind(&entity.content)
                .bind(entity.updated_at)
                .bind(&entity.location_name)
                .bind(entity.location_lat)
                .bind(entity.location_long)
                .bind(entity.privacy.as_str())
                .bind(entity.scheduled_at)
                .bind(entity.view_count)
                .bind(entity.comment_count)
                .bind(entity.share_count)
                .bind(entity.reaction_count)
                .bind(user_id)
                .bind(id.value())
                .execute(&mut *tx)
                .await
                .map_err(backend_err)?;
                if result.rows_affected() == 0 {
                    return Err(RecordError::not_found(EntityKind::Post, id));
                }

                Self::replace_tags(&mut tx, id.value(), &entity.tags)
                    .await
                    .map_err(backend_err)?;
                tx.commit().await.map_err(backend_err)?;

                // Echo the stored ledger state back to the caller.
                let files = self.load_files(&[id.value()]).await?;
                entity.files = files.into_values().next().unwrap_or_default();
                entity.num_files = i32::try_from(entity.files.len()).unwrap_or(i32::MAX);
                Ok(entity)
            }
        }
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Post>, RecordError> {
        let row: Option<PostRow> = sqlx::query_as(&format!("{SELECT} WHERE p.id = $1"))
            .bind(id.value())
            .fetch_optional(self.pool())
            .await
            .map_err(backend_err)?;
        row.map(Post::try_from).transpose()
    }

    async fn find_page(&self, page: &PageRequest) -> Result<Page<Post>, RecordError> {
        let order = order_by(&page.sort, "p.")?;
        let rows: Vec<PostRow> = sqlx::query_as(&format!("{SELECT} {order} LIMIT $1 OFFSET $2"))
            .bind(i64::from(page.effective_size()))
            .bind(page.offset() as i64)
            .fetch_all(self.pool())
            .await
            .map_err(backend_err)?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
            .fetch_one(self.pool())
            .await
            .map_err(backend_err)?;
        let items = rows
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total as u64, page))
    }

    async fn find_all(&self) -> Result<Vec<Post>, RecordError> {
        // Reconciliation export: the search documents must be
        // self-contained, so the export is the eager projection.
        let rows: Vec<PostRow> = sqlx::query_as(SELECT)
            .fetch_all(self.pool())
            .await
            .map_err(backend_err)?;
        let posts = rows
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        self.hydrate_posts(posts).await
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RecordError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id.value())
            .execute(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PostRepository for PostgresRecordStore {
    async fn find_by_id_eager(&self, id: EntityId) -> Result<Option<Post>, RecordError> {
        let Some(post) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        let mut hydrated = self.hydrate_posts(vec![post]).await?;
        Ok(hydrated.pop())
    }

    async fn find_page_eager(&self, page: &PageRequest) -> Result<Page<Post>, RecordError> {
        // Pass one applies pagination and sort; pass two must not
        // re-sort, and the merge keeps pass one's ordering.
        let direct = self.find_page(page).await?;
        let items = self.hydrate_posts(direct.items).await?;
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
        let order = order_by(&page.sort, "p.")?;
        let rows: Vec<PostRow> = sqlx::query_as(&format!(
            "{SELECT} WHERE {TAG_FILTER} {order} LIMIT $2 OFFSET $3"
        ))
        .bind(tag_names)
        .bind(i64::from(page.effective_size()))
        .bind(page.offset() as i64)
        .fetch_all(self.pool())
        .await
        .map_err(backend_err)?;

        let (total,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM posts p WHERE {TAG_FILTER}"
        ))
        .bind(tag_names)
        .fetch_one(self.pool())
        .await
        .map_err(backend_err)?;

        let posts = rows
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let items = self.hydrate_posts(posts).await?;
        Ok(Page::new(items, total as u64, page))
    }

    async fn attach_files(
        &self,
        post_id: EntityId,
        stored_names: &[String],
    ) -> Result<i32, RecordError> {
        let mut tx = self.pool().begin().await.map_err(backend_err)?;

        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
                .bind(post_id.value())
                .fetch_optional(&mut *tx)
                .await
                .map_err(backend_err)?;
        if existing.is_none() {
            return Err(RecordError::not_found(EntityKind::Post, post_id));
        }

        let (next_position,): (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM post_files WHERE post_id = $1",
        )
        .bind(post_id.value())
        .fetch_one(&mut *tx)
        .await
        .map_err(backend_err)?;

        for (offset, name) in stored_names.iter().enumerate() {
            sqlx::query(
                "INSERT INTO post_files (post_id, position, file_name) VALUES ($1, $2, $3)",
            )
            .bind(post_id.value())
            .bind(next_position + i32::try_from(offset).unwrap_or(i32::MAX))
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(backend_err)?;
        }

        // Recompute from the stored list, never increment.
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM post_files WHERE post_id = $1")
                .bind(post_id.value())
                .fetch_one(&mut *tx)
                .await
                .map_err(backend_err)?;
        sqlx::query("UPDATE posts SET num_files = $1 WHERE id = $2")
            .bind(i32::try_from(count).unwrap_or(i32::MAX))
            .bind(post_id.value())
            .execute(&mut *tx)
            .await
            .map_err(backend_err)?;

        tx.commit().await.map_err(backend_err)?;
        Ok(i32::try_from(count).unwrap_or(i32::MAX))
    }
}
