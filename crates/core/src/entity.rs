use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::types::{EntityId, EntityKind};

/// An indexable entity: one of the eleven kinds the record store owns
/// and the index mirror copies.
///
/// The serde bounds exist because a serialized entity is its own search
/// document: backends persist and mirror entities through their JSON
/// projection without any per-kind mapping layer.
pub trait Entity:
    Clone + std::fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// The kind tag, doubling as the table and index collection name.
    const KIND: EntityKind;

    /// Merge-patch representation: same fields, all optional.
    type Patch: std::fmt::Debug + Send;

    /// The assigned id, or `None` before the first save.
    fn id(&self) -> Option<EntityId>;

    /// Record the id assigned by the store.
    fn set_id(&mut self, id: EntityId);

    /// Apply a merge patch: only populated patch fields overwrite.
    fn merge(&mut self, patch: Self::Patch);
}
