use async_trait::async_trait;
use chrono::{DateTime, Utc};

use syncline_core::{EntityId, EntityKind, Page, PageRequest, Share};
use syncline_record::{RecordError, Repository};

use super::user_ref;
use crate::store::{PostgresRecordStore, backend_err, order_by};

#[derive(sqlx::FromRow)]
struct ShareRow {
    id: i64,
    created_at: DateTime<Utc>,
    post_id: Option<i64>,
    user_id: Option<i64>,
    user_login: Option<String>,
}

impl From<ShareRow> for Share {
    fn from(row: ShareRow) -> Self {
        Self {
            id: Some(EntityId(row.id)),
            created_at: row.created_at,
            post_id: row.post_id.map(EntityId),
            user: user_ref(row.user_id, row.user_login),
        }
    }
}

const SELECT: &str = "SELECT s.id, s.created_at, s.post_id, s.user_id, u.login AS user_login \
     FROM shares s LEFT JOIN users u ON u.id = s.user_id";

#[async_trait]
impl Repository<Share> for PostgresRecordStore {
    async fn save(&self, mut entity: Share) -> Result<Share, RecordError> {
        let user_id = entity.user.as_ref().map(|u| u.id.value());
        match entity.id {
            None => {
                let (id,): (i64,) = sqlx::query_as(
                    "INSERT INTO shares (created_at, post_id, user_id) \
                     VALUES ($1, $2, $3) RETURNING id",
                )
                .bind(entity.created_at)
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
                    "UPDATE shares SET created_at = $1, post_id = $2, user_id = $3 WHERE id = $4",
                )
                .bind(entity.created_at)
                .bind(entity.post_id.map(EntityId::value))
                .bind(user_id)
                .bind(id.value())
                .execute(self.pool())
                .await
                .map_err(backend_err)?;
                if result.rows_affected() == 0 {
                    return Err(RecordError::not_found(EntityKind::Share, id));
                }
                Ok(entity)
            }
        }
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Share>, RecordError> {
        let row: Option<ShareRow> = sqlx::query_as(&format!("{SELECT} WHERE s.id = $1"))
            .bind(id.value())
            .fetch_optional(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(row.map(Share::from))
    }

    async fn find_page(&self, page: &PageRequest) -> Result<Page<Share>, RecordError> {
        let order = order_by(&page.sort, "s.")?;
        let rows: Vec<ShareRow> = sqlx::query_as(&format!("{SELECT} {order} LIMIT $1 OFFSET $2"))
            .bind(i64::from(page.effective_size()))
            .bind(page.offset() as i64)
            .fetch_all(self.pool())
            .await
            .map_err(backend_err)?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM shares")
            .fetch_one(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(Page::new(
            rows.into_iter().map(Share::from).collect(),
            total as u64,
            page,
        ))
    }

    async fn find_all(&self) -> Result<Vec<Share>, RecordError> {
        let rows: Vec<ShareRow> = sqlx::query_as(SELECT)
            .fetch_all(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(rows.into_iter().map(Share::from).collect())
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RecordError> {
        let result = sqlx::query("DELETE FROM shares WHERE id = $1")
            .bind(id.value())
            .execute(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(result.rows_affected() > 0)
    }
}
