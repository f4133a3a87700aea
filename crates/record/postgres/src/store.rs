use sqlx::PgPool;

use syncline_core::SortClause;
use syncline_core::page::SortDirection;
use syncline_record::RecordError;

use crate::config::PostgresConfig;
use crate::migrations;

/// Build `PgConnectOptions` from a [`PostgresConfig`], applying the SSL
/// mode when configured.
pub(crate) fn build_connect_options(
    config: &PostgresConfig,
) -> Result<sqlx::postgres::PgConnectOptions, RecordError> {
    let mut options: sqlx::postgres::PgConnectOptions = config
        .url
        .parse()
        .map_err(|e: sqlx::Error| RecordError::Connection(e.to_string()))?;

    if let Some(ref mode) = config.ssl_mode {
        let ssl_mode = match mode.as_str() {
            "disable" => sqlx::postgres::PgSslMode::Disable,
            "prefer" => sqlx::postgres::PgSslMode::Prefer,
            "require" => sqlx::postgres::PgSslMode::Require,
            "verify-ca" => sqlx::postgres::PgSslMode::VerifyCa,
            "verify-full" => sqlx::postgres::PgSslMode::VerifyFull,
            other => {
                return Err(RecordError::Connection(format!("unknown ssl_mode: {other}")));
            }
        };
        options = options.ssl_mode(ssl_mode);
    }

    Ok(options)
}

/// PostgreSQL-backed record store.
///
/// One instance serves every entity kind: the per-kind `Repository`
/// implementations live in [`crate::repos`] and share this pool.
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Connect, build the pool, and ensure the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Connection`] if the pool cannot be
    /// created, or [`RecordError::Backend`] if migrations fail.
    pub async fn new(config: &PostgresConfig) -> Result<Self, RecordError> {
        let connect_options = build_connect_options(config)?;
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.pool_size)
            .connect_with(connect_options)
            .await
            .map_err(|e| RecordError::Connection(e.to_string()))?;

        migrations::run_migrations(&pool)
            .await
            .map_err(|e| RecordError::Backend(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool, running migrations on it.
    pub async fn from_pool(pool: PgPool) -> Result<Self, RecordError> {
        migrations::run_migrations(&pool)
            .await
            .map_err(|e| RecordError::Backend(e.to_string()))?;
        Ok(Self { pool })
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map any sqlx error to a backend error.
pub(crate) fn backend_err(e: sqlx::Error) -> RecordError {
    RecordError::Backend(e.to_string())
}

/// Render an `ORDER BY` clause from the request's sort, falling back to
/// id order.
///
/// Field names are interpolated into SQL, so anything that is not a
/// plain lowercase identifier is rejected rather than quoted.
pub(crate) fn order_by(sort: &[SortClause], prefix: &str) -> Result<String, RecordError> {
    if sort.is_empty() {
        return Ok(format!("ORDER BY {prefix}id ASC"));
    }

    let mut clauses = Vec::with_capacity(sort.len());
    for clause in sort {
        if clause.field.is_empty()
            || !clause
                .field
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(RecordError::Validation(format!(
                "unsortable field: {:?}",
                clause.field
            )));
        }
        let direction = match clause.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        clauses.push(format!("{prefix}{} {direction}", clause.field));
    }
    Ok(format!("ORDER BY {}", clauses.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::order_by;
    use syncline_core::SortClause;

    #[test]
    fn empty_sort_falls_back_to_id() {
        assert_eq!(order_by(&[], "p.").unwrap(), "ORDER BY p.id ASC");
    }

    #[test]
    fn clauses_join_in_request_order() {
        let sql = order_by(
            &[SortClause::desc("created_at"), SortClause::asc("content")],
            "p.",
        )
        .unwrap();
        assert_eq!(sql, "ORDER BY p.created_at DESC, p.content ASC");
    }

    #[test]
    fn hostile_field_names_are_rejected() {
        let result = order_by(&[SortClause::asc("id; DROP TABLE posts")], "");
        assert!(result.is_err());
    }
}
