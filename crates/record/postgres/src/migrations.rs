use sqlx::PgPool;

/// Idempotent schema creation, run once at store construction.
///
/// Every statement is `IF NOT EXISTS`, so re-running against an
/// existing database is a no-op.
const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        login TEXT NOT NULL UNIQUE,
        first_name TEXT,
        last_name TEXT,
        email TEXT
    )",
    "CREATE TABLE IF NOT EXISTS posts (
        id BIGSERIAL PRIMARY KEY,
        content TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        location_name TEXT,
        location_lat DOUBLE PRECISION,
        location_long DOUBLE PRECISION,
        privacy TEXT NOT NULL,
        scheduled_at TIMESTAMPTZ,
        view_count BIGINT NOT NULL DEFAULT 0,
        comment_count BIGINT NOT NULL DEFAULT 0,
        share_count BIGINT NOT NULL DEFAULT 0,
        reaction_count BIGINT NOT NULL DEFAULT 0,
        user_id BIGINT REFERENCES users(id),
        num_files INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS tags (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS post_tags (
        post_id BIGINT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        tag_id BIGINT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY (post_id, tag_id)
    )",
    "CREATE TABLE IF NOT EXISTS post_files (
        post_id BIGINT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        file_name TEXT NOT NULL,
        PRIMARY KEY (post_id, position)
    )",
    "CREATE TABLE IF NOT EXISTS comments (
        id BIGSERIAL PRIMARY KEY,
        content TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        post_id BIGINT REFERENCES posts(id) ON DELETE CASCADE,
        user_id BIGINT REFERENCES users(id)
    )",
    "CREATE TABLE IF NOT EXISTS reactions (
        id BIGSERIAL PRIMARY KEY,
        kind TEXT NOT NULL,
        reacted_at TIMESTAMPTZ NOT NULL,
        post_id BIGINT REFERENCES posts(id) ON DELETE CASCADE,
        user_id BIGINT REFERENCES users(id)
    )",
    "CREATE TABLE IF NOT EXISTS shares (
        id BIGSERIAL PRIMARY KEY,
        created_at TIMESTAMPTZ NOT NULL,
        post_id BIGINT REFERENCES posts(id) ON DELETE CASCADE,
        user_id BIGINT REFERENCES users(id)
    )",
    "CREATE TABLE IF NOT EXISTS favorites (
        id BIGSERIAL PRIMARY KEY,
        saved_at TIMESTAMPTZ NOT NULL,
        post_id BIGINT REFERENCES posts(id) ON DELETE CASCADE,
        user_id BIGINT REFERENCES users(id)
    )",
    "CREATE TABLE IF NOT EXISTS follows (
        id BIGSERIAL PRIMARY KEY,
        created_at TIMESTAMPTZ NOT NULL,
        follower_id BIGINT REFERENCES users(id),
        following_id BIGINT REFERENCES users(id)
    )",
    "CREATE TABLE IF NOT EXISTS mentions (
        id BIGSERIAL PRIMARY KEY,
        post_id BIGINT REFERENCES posts(id) ON DELETE CASCADE,
        user_id BIGINT REFERENCES users(id)
    )",
    "CREATE TABLE IF NOT EXISTS notifications (
        id BIGSERIAL PRIMARY KEY,
        message TEXT NOT NULL,
        is_read BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL,
        user_id BIGINT REFERENCES users(id)
    )",
    "CREATE TABLE IF NOT EXISTS files (
        id BIGSERIAL PRIMARY KEY,
        file_name TEXT NOT NULL,
        file_url TEXT NOT NULL,
        mime_type TEXT NOT NULL,
        file_size BIGINT NOT NULL,
        uploaded_at TIMESTAMPTZ NOT NULL,
        post_id BIGINT REFERENCES posts(id) ON DELETE CASCADE
    )",
    "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments (post_id)",
    "CREATE INDEX IF NOT EXISTS idx_reactions_post ON reactions (post_id)",
    "CREATE INDEX IF NOT EXISTS idx_files_post ON files (post_id)",
    "CREATE INDEX IF NOT EXISTS idx_post_tags_tag ON post_tags (tag_id)",
];

/// Run all schema statements in order.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::debug!(statements = STATEMENTS.len(), "record schema ensured");
    Ok(())
}
