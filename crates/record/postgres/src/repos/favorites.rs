use async_trait::async_trait;
use chrono::{DateTime, Utc};

use syncline_core::{EntityId, EntityKind, Favorite, Page, PageRequest};
use syncline_record::{RecordError, Repository};

use super::user_ref;
use crate::store::{PostgresRecordStore, backend_err, order_by};

#[derive(sqlx::FromRow)]
struct FavoriteRow {
    id: i64,
    saved_at: DateTime<Utc>,
    post_id: Option<i64>,
    user_id: Option<i64>,
    user_login: Option<String>,
}

impl From<FavoriteRow> for Favorite {
    fn from(row: FavoriteRow) -> Self {
        Self {
            id: Some(EntityId(row.id)),
            saved_at: row.saved_at,
            post_id: row.post_id.map(EntityId),
            user: user_ref(row.user_id, row.user_login),
        }
    }
}

const SELECT: &str = "SELECT f.id, f.saved_at, f.post_id, f.user_id, u.login AS user_login \
     FROM favorites f LEFT JOIN users u ON u.id = f.user_id";

#[async_trait]
impl Repository<Favorite> for PostgresRecordStore {
    async fn save(&self, mut entity: Favorite) -> Result<Favorite, RecordError> {
        let user_id = entity.user.as_ref().map(|u| u.id.value());
        match entity.id {
            None => {
                let (id,): (i64,) = sqlx::query_as(
                    "INSERT INTO favorites (saved_at, post_id, user_id) \
                     VALUES ($1, $2, $3) RETURNING id",
                )
                .bind(entity.saved_at)
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
                    "UPDATE favorites SET saved_at = $1, post_id = $2, user_id = $3 WHERE id = $4",
                )
                .bind(entity.saved_at)
                .bind(entity.post_id.map(EntityId::value))
                .bind(user_id)
                .bind(id.value())
                .execute(self.pool())
                .await
                .map_err(backend_err)?;
                if result.rows_affected() == 0 {
                    return Err(RecordError::not_found(EntityKind::Favorite, id));
                }
                Ok(entity)
            }
        }
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Favorite>, RecordError> {
        let row: Option<FavoriteRow> = sqlx::query_as(&format!("{SELECT} WHERE f.id = $1"))
            .bind(id.value())
            .fetch_optional(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(row.map(Favorite::from))
    }

    async fn find_page(&self, page: &PageRequest) -> Result<Page<Favorite>, RecordError> {
        let order = order_by(&page.sort, "f.")?;
        let rows: Vec<FavoriteRow> =
            sqlx::query_as(&format!("{SELECT} {order} LIMIT $1 OFFSET $2"))
                .bind(i64::from(page.effective_size()))
                .bind(page.offset() as i64)
                .fetch_all(self.pool())
                .await
                .map_err(backend_err)?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM favorites")
            .fetch_one(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(Page::new(
            rows.into_iter().map(Favorite::from).collect(),
            total as u64,
            page,
        ))
    }

    async fn find_all(&self) -> Result<Vec<Favorite>, RecordError> {
        let rows: Vec<FavoriteRow> = sqlx::query_as(SELECT)
            .fetch_all(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(rows.into_iter().map(Favorite::from).collect())
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RecordError> {
        let result = sqlx::query("DELETE FROM favorites WHERE id = $1")
            .bind(id.value())
            .execute(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(result.rows_affected() > 0)
    }
}
