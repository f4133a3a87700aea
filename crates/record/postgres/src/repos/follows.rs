use async_trait::async_trait;
use chrono::{DateTime, Utc};

use syncline_core::{EntityId, EntityKind, Follow, Page, PageRequest};
use syncline_record::{RecordError, Repository};

use super::user_ref;
use crate::store::{PostgresRecordStore, backend_err, order_by};

#[derive(sqlx::FromRow)]
struct FollowRow {
    id: i64,
    created_at: DateTime<Utc>,
    follower_id: Option<i64>,
    follower_login: Option<String>,
    following_id: Option<i64>,
    following_login: Option<String>,
}

impl From<FollowRow> for Follow {
    fn from(row: FollowRow) -> Self {
        Self {
            id: Some(EntityId(row.id)),
            created_at: row.created_at,
            follower: user_ref(row.follower_id, row.follower_login),
            following: user_ref(row.following_id, row.following_login),
        }
    }
}

const SELECT: &str = "SELECT f.id, f.created_at, \
     f.follower_id, fu.login AS follower_login, \
     f.following_id, gu.login AS following_login \
     FROM follows f \
     LEFT JOIN users fu ON fu.id = f.follower_id \
     LEFT JOIN users gu ON gu.id = f.following_id";

#[async_trait]
impl Repository<Follow> for PostgresRecordStore {
    async fn save(&self, mut entity: Follow) -> Result<Follow, RecordError> {
        let follower_id = entity.follower.as_ref().map(|u| u.id.value());
        let following_id = entity.following.as_ref().map(|u| u.id.value());
        match entity.id {
            None => {
                let (id,): (i64,) = sqlx::query_as(
                    "INSERT INTO follows (created_at, follower_id, following_id) \
                     VALUES ($1, $2, $3) RETURNING id",
                )
                .bind(entity.created_at)
                .bind(follower_id)
                .bind(following_id)
                .fetch_one(self.pool())
                .await
                .map_err(backend_err)?;
                entity.id = Some(EntityId(id));
                Ok(entity)
            }
            Some(id) => {
                let result = sqlx::query(
                    "UPDATE follows SET created_at = $1, follower_id = $2, following_id = $3 \
                     WHERE id = $4",
                )
                .bind(entity.created_at)
                .bind(follower_id)
                .bind(following_id)
                .bind(id.value())
                .execute(self.pool())
                .await
                .map_err(backend_err)?;
                if result.rows_affected() == 0 {
                    return Err(RecordError::not_found(EntityKind::Follow, id));
                }
                Ok(entity)
            }
        }
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Follow>, RecordError> {
        let row: Option<FollowRow> = sqlx::query_as(&format!("{SELECT} WHERE f.id = $1"))
            .bind(id.value())
            .fetch_optional(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(row.map(Follow::from))
    }

    async fn find_page(&self, page: &PageRequest) -> Result<Page<Follow>, RecordError> {
        let order = order_by(&page.sort, "f.")?;
        let rows: Vec<FollowRow> = sqlx::query_as(&format!("{SELECT} {order} LIMIT $1 OFFSET $2"))
            .bind(i64::from(page.effective_size()))
            .bind(page.offset() as i64)
            .fetch_all(self.pool())
            .await
            .map_err(backend_err)?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM follows")
            .fetch_one(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(Page::new(
            rows.into_iter().map(Follow::from).collect(),
            total as u64,
            page,
        ))
    }

    async fn find_all(&self) -> Result<Vec<Follow>, RecordError> {
        let rows: Vec<FollowRow> = sqlx::query_as(SELECT)
            .fetch_all(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(rows.into_iter().map(Follow::from).collect())
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RecordError> {
        let result = sqlx::query("DELETE FROM follows WHERE id = $1")
            .bind(id.value())
            .execute(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(result.rows_affected() > 0)
    }
}
