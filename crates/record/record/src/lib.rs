//! Repository traits for the system of record.
//!
//! The record store owns canonical identity and relationships for every
//! indexable entity. Backends implement [`Repository`] once, generically,
//! per entity kind; posts additionally implement [`PostRepository`] for
//! the eager two-pass fetch and the attachment ledger.
//!
//! All writes here are authoritative: a failed repository call aborts
//! the surrounding operation before anything reaches the search index.

pub mod error;
pub mod repository;
pub mod testing;

pub use error::RecordError;
pub use repository::{PostRepository, Repository};
