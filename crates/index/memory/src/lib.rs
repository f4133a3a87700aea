//! In-memory search index backend, backed by `DashMap`. Evaluates the
//! parsed query tree against each document's JSON projection; suitable
//! for development and testing.

pub mod store;

pub use store::MemorySearchIndex;
