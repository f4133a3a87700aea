//! In-memory record store backend, backed by `DashMap`. Suitable for
//! development and testing; every gateway test runs against it.

pub mod store;
pub mod table;

pub use store::{MemoryPostStore, MemoryRecordStore};
pub use table::MemoryTable;
