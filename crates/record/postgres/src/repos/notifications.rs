use async_trait::async_trait;
use chrono::{DateTime, Utc};

use syncline_core::{EntityId, EntityKind, Notification, Page, PageRequest};
use syncline_record::{RecordError, Repository};

use super::user_ref;
use crate::store::{PostgresRecordStore, backend_err, order_by};

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    message: String,
    is_read: bool,
    created_at: DateTime<Utc>,
    user_id: Option<i64>,
    user_login: Option<String>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: Some(EntityId(row.id)),
            message: row.message,
            read: row.is_read,
            created_at: row.created_at,
            user: user_ref(row.user_id, row.user_login),
        }
    }
}

const SELECT: &str = "SELECT n.id, n.message, n.is_read, n.created_at, \
     n.user_id, u.login AS user_login \
     FROM notifications n LEFT JOIN users u ON u.id = n.user_id";

#[async_trait]
impl Repository<Notification> for PostgresRecordStore {
    async fn save(&self, mut entity: Notification) -> Result<Notification, RecordError> {
        let user_id = entity.user.as_ref().map(|u| u.id.value());
        match entity.id {
            None => {
                let (id,): (i64,) = sqlx::query_as(
                    "INSERT INTO notifications (message, is_read, created_at, user_id) \
                     VALUES ($1, $2, $3, $4) RETURNING id",
                )
                .bind(&entity.message)
                .bind(entity.read)
                .bind(entity.created_at)
                .bind(user_id)
                .fetch_one(self.pool())
                .await
                .map_err(backend_err)?;
                entity.id = Some(EntityId(id));
                Ok(entity)
            }
            Some(id) => {
                let result = sqlx::query(
                    "UPDATE notifications SET message = $1, is_read = $2, user_id = $3 \
                     WHERE id = $4",
                )
                .bind(&entity.message)
                .bind(entity.read)
                .bind(user_id)
                .bind(id.value())
                .execute(self.pool())
                .await
                .map_err(backend_err)?;
                if result.rows_affected() == 0 {
                    return Err(RecordError::not_found(EntityKind::Notification, id));
                }
                Ok(entity)
            }
        }
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Notification>, RecordError> {
        let row: Option<NotificationRow> = sqlx::query_as(&format!("{SELECT} WHERE n.id = $1"))
            .bind(id.value())
            .fetch_optional(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(row.map(Notification::from))
    }

    async fn find_page(&self, page: &PageRequest) -> Result<Page<Notification>, RecordError> {
        let order = order_by(&page.sort, "n.")?;
        let rows: Vec<NotificationRow> =
            sqlx::query_as(&format!("{SELECT} {order} LIMIT $1 OFFSET $2"))
                .bind(i64::from(page.effective_size()))
                .bind(page.offset() as i64)
                .fetch_all(self.pool())
                .await
                .map_err(backend_err)?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notifications")
            .fetch_one(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(Page::new(
            rows.into_iter().map(Notification::from).collect(),
            total as u64,
            page,
        ))
    }

    async fn find_all(&self) -> Result<Vec<Notification>, RecordError> {
        let rows: Vec<NotificationRow> = sqlx::query_as(SELECT)
            .fetch_all(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(rows.into_iter().map(Notification::from).collect())
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RecordError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id.value())
            .execute(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(result.rows_affected() > 0)
    }
}
