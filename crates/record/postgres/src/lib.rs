//! PostgreSQL-backed system of record.
//!
//! One normalized table per entity kind plus two association tables for
//! the post's multi-valued relationships (`post_tags`, `post_files`).
//! Schema creation is idempotent and runs at store construction.
//!
//! The post eager fetch is the explicit two-pass plan: the paginated
//! scalar query runs first, then the association tables are batch-loaded
//! with `= ANY($ids)` and merged in memory in pass-one order.

pub mod config;
pub mod migrations;
pub mod repos;
pub mod store;

pub use config::PostgresConfig;
pub use store::PostgresRecordStore;
