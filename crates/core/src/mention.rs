use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::refs::UserRef;
use crate::types::{EntityId, EntityKind};

/// A user mentioned in a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    pub id: Option<EntityId>,
    pub post_id: Option<EntityId>,
    pub user: Option<UserRef>,
}

impl Mention {
    #[must_use]
    pub fn new(post_id: EntityId, user: UserRef) -> Self {
        Self {
            id: None,
            post_id: Some(post_id),
            user: Some(user),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MentionPatch {
    pub post_id: Option<EntityId>,
    pub user: Option<UserRef>,
}

impl Entity for Mention {
    const KIND: EntityKind = EntityKind::Mention;
    type Patch = MentionPatch;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn merge(&mut self, patch: MentionPatch) {
        if let Some(post_id) = patch.post_id {
            self.post_id = Some(post_id);
        }
        if let Some(user) = patch.user {
            self.user = Some(user);
        }
    }
}
