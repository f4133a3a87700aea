use async_trait::async_trait;

use syncline_core::{EntityId, EntityKind, Page, PageRequest, Tag};
use syncline_record::{RecordError, Repository};

use crate::store::{PostgresRecordStore, backend_err, order_by};

#[derive(sqlx::FromRow)]
struct TagRow {
    id: i64,
    name: String,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Self {
            id: Some(EntityId(row.id)),
            name: row.name,
        }
    }
}

const SELECT: &str = "SELECT id, name FROM tags";

#[async_trait]
impl Repository<Tag> for PostgresRecordStore {
    async fn save(&self, mut entity: Tag) -> Result<Tag, RecordError> {
        match entity.id {
            None => {
                let (id,): (i64,) =
                    sqlx::query_as("INSERT INTO tags (name) VALUES ($1) RETURNING id")
                        .bind(&entity.name)
                        .fetch_one(self.pool())
                        .await
                        .map_err(backend_err)?;
                entity.id = Some(EntityId(id));
                Ok(entity)
            }
            Some(id) => {
                let result = sqlx::query("UPDATE tags SET name = $1 WHERE id = $2")
                    .bind(&entity.name)
                    .bind(id.value())
                    .execute(self.pool())
                    .await
                    .map_err(backend_err)?;
                if result.rows_affected() == 0 {
                    return Err(RecordError::not_found(EntityKind::Tag, id));
                }
                Ok(entity)
            }
        }
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Tag>, RecordError> {
        let row: Option<TagRow> = sqlx::query_as(&format!("{SELECT} WHERE id = $1"))
            .bind(id.value())
            .fetch_optional(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(row.map(Tag::from))
    }

    async fn find_page(&self, page: &PageRequest) -> Result<Page<Tag>, RecordError> {
        let order = order_by(&page.sort, "")?;
        let rows: Vec<TagRow> = sqlx::query_as(&format!("{SELECT} {order} LIMIT $1 OFFSET $2"))
            .bind(i64::from(page.effective_size()))
            .bind(page.offset() as i64)
            .fetch_all(self.pool())
            .await
            .map_err(backend_err)?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags")
            .fetch_one(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(Page::new(
            rows.into_iter().map(Tag::from).collect(),
            total as u64,
            page,
        ))
    }

    async fn find_all(&self) -> Result<Vec<Tag>, RecordError> {
        let rows: Vec<TagRow> = sqlx::query_as(SELECT)
            .fetch_all(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(rows.into_iter().map(Tag::from).collect())
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RecordError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id.value())
            .execute(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(result.rows_affected() > 0)
    }
}
