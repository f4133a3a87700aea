//! Elasticsearch-backed search index, using the REST API via `reqwest`.
//!
//! One Elasticsearch index per entity kind, named from the configured
//! prefix. Query expressions are not parsed locally: the raw string
//! goes to `query_string`, whose grammar matches the crate-level query
//! language.

pub mod config;
pub mod store;

pub use config::ElasticsearchConfig;
pub use store::ElasticsearchIndex;
