use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::refs::UserRef;
use crate::types::{EntityId, EntityKind};

/// A follower/following edge between two users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    pub id: Option<EntityId>,
    pub created_at: DateTime<Utc>,
    pub follower: Option<UserRef>,
    pub following: Option<UserRef>,
}

impl Follow {
    #[must_use]
    pub fn new(follower: UserRef, following: UserRef) -> Self {
        Self {
            id: None,
            created_at: Utc::now(),
            follower: Some(follower),
            following: Some(following),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FollowPatch {
    pub follower: Option<UserRef>,
    pub following: Option<UserRef>,
}

impl Entity for Follow {
    const KIND: EntityKind = EntityKind::Follow;
    type Patch = FollowPatch;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn merge(&mut self, patch: FollowPatch) {
        if let Some(follower) = patch.follower {
            self.follower = Some(follower);
        }
        if let Some(following) = patch.following {
            self.following = Some(following);
        }
    }
}
