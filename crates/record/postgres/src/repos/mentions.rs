use async_trait::async_trait;

use syncline_core::{EntityId, EntityKind, Mention, Page, PageRequest};
use syncline_record::{RecordError, Repository};

use super::user_ref;
use crate::store::{PostgresRecordStore, backend_err, order_by};

#[derive(sqlx::FromRow)]
struct MentionRow {
    id: i64,
    post_id: Option<i64>,
    user_id: Option<i64>,
    user_login: Option<String>,
}

impl From<MentionRow> for Mention {
    fn from(row: MentionRow) -> Self {
        Self {
            id: Some(EntityId(row.id)),
            post_id: row.post_id.map(EntityId),
            user: user_ref(row.user_id, row.user_login),
        }
    }
}

const SELECT: &str = "SELECT m.id, m.post_id, m.user_id, u.login AS user_login \
     FROM mentions m LEFT JOIN users u ON u.id = m.user_id";

#[async_trait]
impl Repository<Mention> for PostgresRecordStore {
    async fn save(&self, mut entity: Mention) -> Result<Mention, RecordError> {
        let user_id = entity.user.as_ref().map(|u| u.id.value());
        match entity.id {
            None => {
                let (id,): (i64,) = sqlx::query_as(
                    "INSERT INTO mentions (post_id, user_id) VALUES ($1, $2) RETURNING id",
                )
                .bind(entity.post_id.map(EntityId::value))
                .bind(user_id)
                .fetch_one(self.pool())
                .await
                .map_err(backend_err)?;
                entity.id = Some(EntityId(id));
                Ok(entity)
            }
            Some(id) => {
                let result =
                    sqlx::query("UPDATE mentions SET post_id = $1, user_id = $2 WHERE id = $3")
                        .bind(entity.post_id.map(EntityId::value))
                        .bind(user_id)
                        .bind(id.value())
                        .execute(self.pool())
                        .await
                        .map_err(backend_err)?;
                if result.rows_affected() == 0 {
                    return Err(RecordError::not_found(EntityKind::Mention, id));
                }
                Ok(entity)
            }
        }
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Mention>, RecordError> {
        let row: Option<MentionRow> = sqlx::query_as(&format!("{SELECT} WHERE m.id = $1"))
            .bind(id.value())
            .fetch_optional(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(row.map(Mention::from))
    }

    async fn find_page(&self, page: &PageRequest) -> Result<Page<Mention>, RecordError> {
        let order = order_by(&page.sort, "m.")?;
        let rows: Vec<MentionRow> =
            sqlx::query_as(&format!("{SELECT} {order} LIMIT $1 OFFSET $2"))
                .bind(i64::from(page.effective_size()))
                .bind(page.offset() as i64)
                .fetch_all(self.pool())
                .await
                .map_err(backend_err)?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM mentions")
            .fetch_one(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(Page::new(
            rows.into_iter().map(Mention::from).collect(),
            total as u64,
            page,
        ))
    }

    async fn find_all(&self) -> Result<Vec<Mention>, RecordError> {
        let rows: Vec<MentionRow> = sqlx::query_as(SELECT)
            .fetch_all(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(rows.into_iter().map(Mention::from).collect())
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RecordError> {
        let result = sqlx::query("DELETE FROM mentions WHERE id = $1")
            .bind(id.value())
            .execute(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(result.rows_affected() > 0)
    }
}
