use async_trait::async_trait;
use chrono::{DateTime, Utc};

use syncline_core::{EntityId, EntityKind, FileRecord, Page, PageRequest};
use syncline_record::{RecordError, Repository};

use crate::store::{PostgresRecordStore, backend_err, order_by};

#[derive(sqlx::FromRow)]
struct FileRow {
    id: i64,
    file_name: String,
    file_url: String,
    mime_type: String,
    file_size: i64,
    uploaded_at: DateTime<Utc>,
    post_id: Option<i64>,
}

impl From<FileRow> for FileRecord {
    fn from(row: FileRow) -> Self {
        Self {
            id: Some(EntityId(row.id)),
            file_name: row.file_name,
            file_url: row.file_url,
            mime_type: row.mime_type,
            file_size: row.file_size,
            uploaded_at: row.uploaded_at,
            post_id: row.post_id.map(EntityId),
        }
    }
}

const SELECT: &str =
    "SELECT id, file_name, file_url, mime_type, file_size, uploaded_at, post_id FROM files";

#[async_trait]
impl Repository<FileRecord> for PostgresRecordStore {
    async fn save(&self, mut entity: FileRecord) -> Result<FileRecord, RecordError> {
        match entity.id {
            None => {
                let (id,): (i64,) = sqlx::query_as(
                    "INSERT INTO files (file_name, file_url, mime_type, file_size, \
                     uploaded_at, post_id) VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
                )
                .bind(&entity.file_name)
                .bind(&entity.file_url)
                .bind(&entity.mime_type)
                .bind(entity.file_size)
                .bind(entity.uploaded_at)
                .bind(entity.post_id.map(EntityId::value))
                .fetch_one(self.pool())
                .await
                .map_err(backend_err)?;
                entity.id = Some(EntityId(id));
                Ok(entity)
            }
            Some(id) => {
                let result = sqlx::query(
                    "UPDATE files SET file_name = $1, file_url = $2, mime_type = $3, \
                     file_size = $4, uploaded_at = $5, post_id = $6 WHERE id = $7",
                )
                .bind(&entity.file_name)
                .bind(&entity.file_url)
                .bind(&entity.mime_type)
                .bind(entity.file_size)
                .bind(entity.uploaded_at)
                .bind(entity.post_id.map(EntityId::value))
                .bind(id.value())
                .execute(self.pool())
                .await
                .map_err(backend_err)?;
                if result.rows_affected() == 0 {
                    return Err(RecordError::not_found(EntityKind::File, id));
                }
                Ok(entity)
            }
        }
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<FileRecord>, RecordError> {
        let row: Option<FileRow> = sqlx::query_as(&format!("{SELECT} WHERE id = $1"))
            .bind(id.value())
            .fetch_optional(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(row.map(FileRecord::from))
    }

    async fn find_page(&self, page: &PageRequest) -> Result<Page<FileRecord>, RecordError> {
        let order = order_by(&page.sort, "")?;
        let rows: Vec<FileRow> = sqlx::query_as(&format!("{SELECT} {order} LIMIT $1 OFFSET $2"))
            .bind(i64::from(page.effective_size()))
            .bind(page.offset() as i64)
            .fetch_all(self.pool())
            .await
            .map_err(backend_err)?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM files")
            .fetch_one(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(Page::new(
            rows.into_iter().map(FileRecord::from).collect(),
            total as u64,
            page,
        ))
    }

    async fn find_all(&self) -> Result<Vec<FileRecord>, RecordError> {
        let rows: Vec<FileRow> = sqlx::query_as(SELECT)
            .fetch_all(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(rows.into_iter().map(FileRecord::from).collect())
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RecordError> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id.value())
            .execute(self.pool())
            .await
            .map_err(backend_err)?;
        Ok(result.rows_affected() > 0)
    }
}
