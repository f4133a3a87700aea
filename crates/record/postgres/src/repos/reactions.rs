use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use syncline_core::{EntityId, EntityKind, Page, PageRequest, Reaction, ReactionKind};
use syncline_record::{RecordError, Repository};

use super::user_ref;
use crate::store::{PostgresRecordStore, backend_err, order_by};

#[derive(sqlx::FromRow)]
struct ReactionRow {
    id: i64,
    kind: String,
    reacted_at: DateTime<Utc>,
    post_id: Option<i64>,
    user_id: Option<i64>,
    user_login: Option<String>,
}

impl TryFrom<ReactionRow> for Reaction {
    type Error = RecordError;

    fn try_from(row: ReactionRow) -> Result<Self, RecordError> {
        Ok(Self {
            id: Some(EntityId(row.id)),
            kind: ReactionKind::from_str(&row.kind).map_err(RecordError::Serialization)?,
            reacted_at: row.reacted_at,
            post_id: row.post_id.map(EntityId),
            user: user_ref(row.user_id, row.user_login),
        })
    }
}

const SELECT: &str = "SELECT r.id, r.kind, r.reacted_at, r.post_id, \
     r.user_id, u.login AS user_login \
     FROM reactions r LEFT JOIN users u ON u.id = r.user_id";

#[async_trait]
impl Repository<Reaction> for PostgresRecordStore {
    async fn save(&self, mut entity: Reaction) -> Result<Reaction, RecordError> {
        let user_id = entity.user.as_ref().map(|u| u.id.value());
        match entity.id {
            None => {
                let (id,): (i64,) = sqlx::query_as(
                    "INSERT INTO reactions (kind, reacted_at, post_id, user_id) \
                     VALUES ($1, $2, $3, $4) RETURNING id",
                )
                .bind(entity.kind.as_str())
                .bind(entity.reacted_at)
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
                    "UPDATE reactions SET kind = $1, reacted_at = $2, post_id = $3, \
                     user_id = $4 WHERE id = $5",
                )
                .bind(entity.kind.as_str())
                .bind(entity.reacted_at)
                .bind(entity.post_id.map(EntityId::value))
                .bind(user_id)
                .bind(id.value())
                .execute(self.pool())
                .await
                .map_err(backend_err)?;
                if result.rows_affected() == 0 {
                    return Err(RecordError::not_found(EntityKind::Reaction, id));
                }
                Ok(entity)
            }
        }
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Reaction>, RecordError> {
        let row: Option<ReactionRow> = sqlx::query_as(&format!("{SELECT} WHERE r.id = $1"))
            .bind(id.value())
            .fetch_optional(self.pool())
            .await
            .map_err(backend_err)?;
        row.map(Reaction::try_from).transpose()
    }

    async fn find_page(&self, page: &PageRequest) -> Result<Page<Reaction>, RecordError> {
        let order = order_by(&page.sort, "r.")?;
        let rows: Vec<ReactionRow> =
            sqlx::query_as(&format!("{SELECT} {order} LIMIT $1 OFFSET $2"))
                .bind(i64::from(page.effective_size()))
                .bind(page.offset() as i64)
                .fetch_all(self.pool())
                .await
                .map_err(backend_err)?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reactions")
            .fetch_one(self.pool())
            .await
            .map_err(backend_err)?;
        let items = rows
            .into_iter()
            .map(Reaction::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total as u64, page))
    }

    async fn find_all(&self) -> Result<Vec<Reaction>, RecordError> {
        let rows: Vec<ReactionRow> = sqlx::query_as(SELECT)
            .fetch_all(self.pool())
            .await
            .map_err(backend_err)?;
        rows.into_iter().map(Reaction::try_from).collect()
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RecordError> {
        let result = sqlx::query("DELETE FROM reactions WHERE id = $1")
            .bind(id.value())
            .execute(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(result.rows_affected() > 0)
    }
}
