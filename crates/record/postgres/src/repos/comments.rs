use async_trait::async_trait;
use chrono::{DateTime, Utc};

use syncline_core::{Comment, EntityId, EntityKind, Page, PageRequest};
use syncline_record::{RecordError, Repository};

use super::user_ref;
use crate::store::{PostgresRecordStore, backend_err, order_by};

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    post_id: Option<i64>,
    user_id: Option<i64>,
    user_login: Option<String>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: Some(EntityId(row.id)),
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
            post_id: row.post_id.map(EntityId),
            user: user_ref(row.user_id, row.user_login),
        }
    }
}

const SELECT: &str = "SELECT c.id, c.content, c.created_at, c.updated_at, c.post_id, \
     c.user_id, u.login AS user_login \
     FROM comments c LEFT JOIN users u ON u.id = c.user_id";

#[async_trait]
impl Repository<Comment> for PostgresRecordStore {
    async fn save(&self, mut entity: Comment) -> Result<Comment, RecordError> {
        let user_id = entity.user.as_ref().map(|u| u.id.value());
        match entity.id {
            None => {
                let (id,): (i64,) = sqlx::query_as(
                    "INSERT INTO comments (content, created_at, updated_at, post_id, user_id) \
                     VALUES ($1, $2, $3, $4, $5) RETURNING id",
                )
                .bind(&entity.content)
                .bind(entity.created_at)
                .bind(entity.updated_at)
                .bind(entity.post_id.map(EntityId::value))
                .bind(user_id)
                .fetch_one(self.pool())
                .await
                .map_err(backend_err)?;
                entity.id = Some(EntityId(id));
                Ok(entity)
            }
            Some(id) => {
                let result = sqlx::query(
                    "UPDATE comments SET content = $1, updated_at = $2, post_id = $3, \
                     user_id = $4 WHERE id = $5",
                )
                .bind(&entity.content)
                .bind(entity.updated_at)
                .bind(entity.post_id.map(EntityId::value))
                .bind(user_id)
                .bind(id.value())
                .execute(self.pool())
                .await
                .map_err(backend_err)?;
                if result.rows_affected() == 0 {
                    return Err(RecordError::not_found(EntityKind::Comment, id));
                }
                Ok(entity)
            }
        }
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Comment>, RecordError> {
        let row: Option<CommentRow> = sqlx::query_as(&format!("{SELECT} WHERE c.id = $1"))
            .bind(id.value())
            .fetch_optional(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(row.map(Comment::from))
    }

    async fn find_page(&self, page: &PageRequest) -> Result<Page<Comment>, RecordError> {
        let order = order_by(&page.sort, "c.")?;
        let rows: Vec<CommentRow> =
            sqlx::query_as(&format!("{SELECT} {order} LIMIT $1 OFFSET $2"))
                .bind(i64::from(page.effective_size()))
                .bind(page.offset() as i64)
                .fetch_all(self.pool())
                .await
                .map_err(backend_err)?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments")
            .fetch_one(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(Page::new(
            rows.into_iter().map(Comment::from).collect(),
            total as u64,
            page,
        ))
    }

    async fn find_all(&self) -> Result<Vec<Comment>, RecordError> {
        let rows: Vec<CommentRow> = sqlx::query_as(SELECT)
            .fetch_all(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RecordError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id.value())
            .execute(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(result.rows_affected() > 0)
    }
}
