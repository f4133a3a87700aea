use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::types::{EntityId, EntityKind};

/// A tag. Names are unique within the record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Option<EntityId>,
    pub name: String,
}

impl Tag {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagPatch {
    pub name: Option<String>,
}

impl Entity for Tag {
    const KIND: EntityKind = EntityKind::Tag;
    type Patch = TagPatch;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn merge(&mut self, patch: TagPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
    }
}
