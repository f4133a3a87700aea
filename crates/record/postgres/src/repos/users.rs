use async_trait::async_trait;

use syncline_core::{EntityId, EntityKind, Page, PageRequest, User};
use syncline_record::{RecordError, Repository};

use crate::store::{PostgresRecordStore, backend_err, order_by};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    login: String,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: Some(EntityId(row.id)),
            login: row.login,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
        }
    }
}

const SELECT: &str = "SELECT id, login, first_name, last_name, email FROM users";

#[async_trait]
impl Repository<User> for PostgresRecordStore {
    async fn save(&self, mut entity: User) -> Result<User, RecordError> {
        match entity.id {
            None => {
                let (id,): (i64,) = sqlx::query_as(
                    "INSERT INTO users (login, first_name, last_name, email) \
                     VALUES ($1, $2, $3, $4) RETURNING id",
                )
                .bind(&entity.login)
                .bind(&entity.first_name)
                .bind(&entity.last_name)
                .bind(&entity.email)
                .fetch_one(self.pool())
                .await
                .map_err(backend_err)?;
                entity.id = Some(EntityId(id));
                Ok(entity)
            }
            Some(id) => {
                let result = sqlx::query(
                    "UPDATE users SET login = $1, first_name = $2, last_name = $3, email = $4 \
                     WHERE id = $5",
                )
                .bind(&entity.login)
                .bind(&entity.first_name)
                .bind(&entity.last_name)
                .bind(&entity.email)
                .bind(id.value())
                .execute(self.pool())
                .await
                .map_err(backend_err)?;
                if result.rows_affected() == 0 {
                    return Err(RecordError::not_found(EntityKind::User, id));
                }
                Ok(entity)
            }
        }
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<User>, RecordError> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{SELECT} WHERE id = $1"))
            .bind(id.value())
            .fetch_optional(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(row.map(User::from))
    }

    async fn find_page(&self, page: &PageRequest) -> Result<Page<User>, RecordError> {
        let order = order_by(&page.sort, "")?;
        let rows: Vec<UserRow> = sqlx::query_as(&format!("{SELECT} {order} LIMIT $1 OFFSET $2"))
            .bind(i64::from(page.effective_size()))
            .bind(page.offset() as i64)
            .fetch_all(self.pool())
            .await
            .map_err(backend_err)?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(Page::new(
            rows.into_iter().map(User::from).collect(),
            total as u64,
            page,
        ))
    }

    async fn find_all(&self) -> Result<Vec<User>, RecordError> {
        let rows: Vec<UserRow> = sqlx::query_as(SELECT)
            .fetch_all(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RecordError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.value())
            .execute(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(result.rows_affected() > 0)
    }
}
