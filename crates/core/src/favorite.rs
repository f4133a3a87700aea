use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::refs::UserRef;
use crate::types::{EntityId, EntityKind};

/// A post saved to a user's favorites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    pub id: Option<EntityId>,
    pub saved_at: DateTime<Utc>,
    pub post_id: Option<EntityId>,
    pub user: Option<UserRef>,
}

impl Favorite {
    #[must_use]
    pub fn new(post_id: EntityId) -> Self {
        Self {
            id: None,
            saved_at: Utc::now(),
            post_id: Some(post_id),
            user: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FavoritePatch {
    pub saved_at: Option<DateTime<Utc>>,
    pub post_id: Option<EntityId>,
    pub user: Option<UserRef>,
}

impl Entity for Favorite {
    const KIND: EntityKind = EntityKind::Favorite;
    type Patch = FavoritePatch;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn merge(&mut self, patch: FavoritePatch) {
        if let Some(at) = patch.saved_at {
            self.saved_at = at;
        }
        if let Some(post_id) = patch.post_id {
            self.post_id = Some(post_id);
        }
        if let Some(user) = patch.user {
            self.user = Some(user);
        }
    }
}
