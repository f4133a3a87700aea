use std::sync::Arc;

use tracing::{debug, warn};

use syncline_core::{Entity, EntityId, Page, PageRequest};
use syncline_index::SearchIndex;
use syncline_record::Repository;

use crate::error::GatewayError;

/// The one generic synchronized-write service, instantiated per entity
/// kind.
///
/// Parameterizing a single implementation by (repository, index) is
/// what keeps the four-step write pattern identical across all eleven
/// kinds: there is no per-kind copy to drift.
///
/// Known limitation: under concurrent writers to the same id, the
/// record store's committed winner and the mirror's last-arriving
/// propagation are decided independently, so the mirror may converge to
/// a different snapshot than the record store until the next write or
/// reindex. No version stamp guards against this.
pub struct EntityService<E: Entity> {
    repo: Arc<dyn Repository<E>>,
    index: Arc<dyn SearchIndex<E>>,
}

impl<E: Entity> Clone for EntityService<E> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            index: Arc::clone(&self.index),
        }
    }
}

impl<E: Entity> EntityService<E> {
    #[must_use]
    pub fn new(repo: Arc<dyn Repository<E>>, index: Arc<dyn SearchIndex<E>>) -> Self {
        Self { repo, index }
    }

    /// Create or fully update, then propagate to the mirror.
    pub async fn save(&self, entity: E) -> Result<E, GatewayError> {
        debug!(kind = %E::KIND, "request to save");
        let saved = self.repo.save(entity).await?;
        self.propagate(&saved).await;
        Ok(saved)
    }

    /// Full update of an existing row. Fails with a validation error if
    /// the entity carries no id, and not-found if the id is unknown.
    pub async fn update(&self, entity: E) -> Result<E, GatewayError> {
        if entity.id().is_none() {
            return Err(GatewayError::Validation(
                "update requires an id".to_owned(),
            ));
        }
        self.save(entity).await
    }

    /// Merge-patch an existing row: only populated patch fields
    /// overwrite. Returns `None` when the id is unknown.
    pub async fn partial_update(
        &self,
        id: EntityId,
        patch: E::Patch,
    ) -> Result<Option<E>, GatewayError> {
        debug!(kind = %E::KIND, %id, "request to partially update");
        let Some(mut existing) = self.repo.find_by_id(id).await? else {
            return Ok(None);
        };
        existing.merge(patch);
        let saved = self.repo.save(existing).await?;
        self.propagate(&saved).await;
        Ok(Some(saved))
    }

    pub async fn find_one(&self, id: EntityId) -> Result<Option<E>, GatewayError> {
        Ok(self.repo.find_by_id(id).await?)
    }

    pub async fn find_page(&self, page: &PageRequest) -> Result<Page<E>, GatewayError> {
        Ok(self.repo.find_page(page).await?)
    }

    /// Delete from the record store first, then from the mirror, in
    /// that order. Returns whether the row existed.
    pub async fn delete(&self, id: EntityId) -> Result<bool, GatewayError> {
        debug!(kind = %E::KIND, %id, "request to delete");
        let existed = self.repo.delete_by_id(id).await?;
        self.propagate_delete(id).await;
        Ok(existed)
    }

    /// Evaluate a search query against the mirror.
    pub async fn search(
        &self,
        query: &str,
        page: &PageRequest,
    ) -> Result<Page<E>, GatewayError> {
        debug!(kind = %E::KIND, query, "request to search");
        self.index
            .search(query, page)
            .await
            .map_err(GatewayError::Search)
    }

    /// Step three: push the committed row into the mirror. Failures are
    /// logged and swallowed; the record store already committed, so the
    /// write is reported as successful and the mirror stays stale until
    /// repaired.
    pub(crate) async fn propagate(&self, entity: &E) {
        if let Err(e) = self.index.index(entity).await {
            warn!(kind = %E::KIND, error = %e, "index propagation failed; mirror stale until next write or reindex");
        }
    }

    pub(crate) async fn propagate_delete(&self, id: EntityId) {
        if let Err(e) = self.index.delete_by_id(id).await {
            warn!(kind = %E::KIND, %id, error = %e, "index delete propagation failed; stale document remains");
        }
    }
}
