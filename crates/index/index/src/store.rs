use async_trait::async_trait;

use syncline_core::{Entity, EntityId, Page, PageRequest};

use crate::error::IndexError;

/// One search collection, holding the denormalized documents of a single
/// entity kind.
///
/// The document type is the entity itself: entities embed their to-one
/// and to-many projections, so every document is self-contained and
/// `index` needs no lookup back into the record store. Calling `index`
/// with an id the record store never assigned (or has since deleted)
/// must not corrupt the collection; the document simply exists until
/// something deletes it.
#[async_trait]
pub trait SearchIndex<D: Entity>: Send + Sync {
    /// Evaluate a query expression and return one page of matching
    /// documents, preserving the requested sort and size, with the total
    /// hit count for pagination headers.
    async fn search(&self, query: &str, page: &PageRequest) -> Result<Page<D>, IndexError>;

    /// Upsert the document keyed by its record id.
    async fn index(&self, doc: &D) -> Result<(), IndexError>;

    /// Remove the document if present; absence is not an error.
    async fn delete_by_id(&self, id: EntityId) -> Result<(), IndexError>;
}
