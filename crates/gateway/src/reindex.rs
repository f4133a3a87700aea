use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use syncline_core::{Entity, EntityId, EntityKind, PageRequest};
use syncline_index::SearchIndex;
use syncline_record::Repository;

use crate::error::GatewayError;

/// Page size used when walking a mirror collection during pruning.
const PRUNE_SCAN_SIZE: u32 = 500;

/// Outcome of reconciling one entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReindexEntry {
    pub kind: EntityKind,
    /// Documents successfully upserted.
    pub indexed: u64,
    /// Rows whose upsert failed (left stale, repairable by re-running).
    pub failed: u64,
    /// Stale documents removed; only nonzero on pruning runs.
    pub pruned: u64,
}

/// Outcome of a full reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct ReindexReport {
    pub entries: Vec<ReindexEntry>,
}

impl ReindexReport {
    /// Total documents upserted across all kinds.
    #[must_use]
    pub fn total_indexed(&self) -> u64 {
        self.entries.iter().map(|e| e.indexed).sum()
    }

    /// Total stale documents removed across all kinds.
    #[must_use]
    pub fn total_pruned(&self) -> u64 {
        self.entries.iter().map(|e| e.pruned).sum()
    }
}

/// One entity kind's exporter/importer pair, object-safe so the
/// [`Reindexer`] can hold all kinds in one list with no cross-kind
/// ordering.
#[async_trait]
pub trait ReindexTarget: Send + Sync {
    fn kind(&self) -> EntityKind;

    /// Re-derive every mirror document from the record store. Pure
    /// upserts keyed by id, so re-running from any partial state
    /// converges to the same result.
    async fn reindex(&self) -> Result<ReindexEntry, GatewayError>;

    /// Like [`ReindexTarget::reindex`], but afterwards walks the mirror
    /// and deletes documents whose ids the export did not produce,
    /// closing the stale-document gap a crashed delete leaves behind.
    async fn reindex_pruning(&self) -> Result<ReindexEntry, GatewayError>;
}

/// Generic [`ReindexTarget`] over a (repository, index) pair.
pub struct EntityReindexer<E: Entity> {
    repo: Arc<dyn Repository<E>>,
    index: Arc<dyn SearchIndex<E>>,
}

impl<E: Entity> EntityReindexer<E> {
    #[must_use]
    pub fn new(repo: Arc<dyn Repository<E>>, index: Arc<dyn SearchIndex<E>>) -> Self {
        Self { repo, index }
    }

    /// Export every row and upsert it, returning (indexed, failed, ids).
    async fn upsert_all(&self) -> Result<(u64, u64, HashSet<i64>), GatewayError> {
        let rows = self.repo.find_all().await.map_err(GatewayError::Record)?;
        let mut indexed = 0u64;
        let mut failed = 0u64;
        let mut exported_ids = HashSet::with_capacity(rows.len());

        for row in &rows {
            if let Some(id) = row.id() {
                exported_ids.insert(id.value());
            }
            match self.index.index(row).await {
                Ok(()) => indexed += 1,
                Err(e) => {
                    failed += 1;
                    warn!(kind = %E::KIND, error = %e, "reindex upsert failed; document stays stale");
                }
            }
        }
        Ok((indexed, failed, exported_ids))
    }

    /// Collect every id currently in the mirror by paging a match-all
    /// search. Ids are gathered fully before any delete, so pagination
    /// is not disturbed by the removals.
    async fn mirror_ids(&self) -> Result<Vec<EntityId>, GatewayError> {
        let mut ids = Vec::new();
        let mut page = PageRequest::of(0, PRUNE_SCAN_SIZE);
        loop {
            let result = self
                .index
                .search("", &page)
                .await
                .map_err(GatewayError::Search)?;
            ids.extend(result.items.iter().filter_map(Entity::id));

            let seen = u64::from(page.page + 1) * u64::from(PRUNE_SCAN_SIZE);
            if seen >= result.total || result.items.is_empty() {
                break;
            }
            page.page += 1;
        }
        Ok(ids)
    }
}

#[async_trait]
impl<E: Entity> ReindexTarget for EntityReindexer<E> {
    fn kind(&self) -> EntityKind {
        E::KIND
    }

    async fn reindex(&self) -> Result<ReindexEntry, GatewayError> {
        let (indexed, failed, _) = self.upsert_all().await?;
        Ok(ReindexEntry {
            kind: E::KIND,
            indexed,
            failed,
            pruned: 0,
        })
    }

    async fn reindex_pruning(&self) -> Result<ReindexEntry, GatewayError> {
        let (indexed, failed, exported_ids) = self.upsert_all().await?;

        let mut pruned = 0u64;
        for id in self.mirror_ids().await? {
            if !exported_ids.contains(&id.value()) {
                match self.index.delete_by_id(id).await {
                    Ok(()) => pruned += 1,
                    Err(e) => {
                        warn!(kind = %E::KIND, %id, error = %e, "prune delete failed; stale document remains");
                    }
                }
            }
        }

        Ok(ReindexEntry {
            kind: E::KIND,
            indexed,
            failed,
            pruned,
        })
    }
}

/// The operator-triggered bulk repair: re-derives every mirror
/// collection from the record store.
///
/// A pure function over the (record store snapshot, mirror) pair: no
/// shared process state, fully restartable, and no cross-kind ordering
/// requirement. Intended to run with no concurrent writers; running
/// alongside writers is tolerated because every upsert is
/// order-independent per id, with the usual last-write-wins caveat.
pub struct Reindexer {
    targets: Vec<Arc<dyn ReindexTarget>>,
}

impl Reindexer {
    #[must_use]
    pub fn new(targets: Vec<Arc<dyn ReindexTarget>>) -> Self {
        Self { targets }
    }

    /// Upsert-only reconciliation. Documents for ids deleted from the
    /// record store are NOT removed; that gap needs
    /// [`Reindexer::reindex_all_pruning`].
    pub async fn reindex_all(&self) -> Result<ReindexReport, GatewayError> {
        let mut report = ReindexReport::default();
        for target in &self.targets {
            let entry = target.reindex().await?;
            info!(kind = %entry.kind, indexed = entry.indexed, failed = entry.failed, "reindexed");
            report.entries.push(entry);
        }
        info!(total = report.total_indexed(), "reindex complete");
        Ok(report)
    }

    /// Reconciliation that also deletes mirror documents whose ids no
    /// longer exist in the record store.
    pub async fn reindex_all_pruning(&self) -> Result<ReindexReport, GatewayError> {
        let mut report = ReindexReport::default();
        for target in &self.targets {
            let entry = target.reindex_pruning().await?;
            info!(
                kind = %entry.kind,
                indexed = entry.indexed,
                failed = entry.failed,
                pruned = entry.pruned,
                "reindexed with prune"
            );
            report.entries.push(entry);
        }
        info!(
            total = report.total_indexed(),
            pruned = report.total_pruned(),
            "pruning reindex complete"
        );
        Ok(report)
    }
}
