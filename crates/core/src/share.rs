use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::refs::UserRef;
use crate::types::{EntityId, EntityKind};

/// A re-share of a post by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Share {
    pub id: Option<EntityId>,
    pub created_at: DateTime<Utc>,
    pub post_id: Option<EntityId>,
    pub user: Option<UserRef>,
}

impl Share {
    #[must_use]
    pub fn new(post_id: EntityId) -> Self {
        Self {
            id: None,
            created_at: Utc::now(),
            post_id: Some(post_id),
            user: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SharePatch {
    pub post_id: Option<EntityId>,
    pub user: Option<UserRef>,
}

impl Entity for Share {
    const KIND: EntityKind = EntityKind::Share;
    type Patch = SharePatch;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn merge(&mut self, patch: SharePatch) {
        if let Some(post_id) = patch.post_id {
            self.post_id = Some(post_id);
        }
        if let Some(user) = patch.user {
            self.user = Some(user);
        }
    }
}
