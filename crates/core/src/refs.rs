use serde::{Deserialize, Serialize};

use crate::types::EntityId;

/// Denormalized to-one projection of a user, embedded where an entity
/// references its author or owner. Carrying the login alongside the id
/// keeps every serialized entity self-contained as a search document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: EntityId,
    pub login: String,
}

impl UserRef {
    #[must_use]
    pub fn new(id: impl Into<EntityId>, login: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            login: login.into(),
        }
    }
}

/// Denormalized projection of a tag. Search matches on tag names, not
/// ids, so the name travels with every post document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub id: EntityId,
    pub name: String,
}

impl TagRef {
    #[must_use]
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
