use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::refs::UserRef;
use crate::types::{EntityId, EntityKind};

/// A comment on a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Option<EntityId>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub post_id: Option<EntityId>,
    pub user: Option<UserRef>,
}

impl Comment {
    #[must_use]
    pub fn new(content: impl Into<String>, post_id: EntityId) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            content: content.into(),
            created_at: now,
            updated_at: now,
            post_id: Some(post_id),
            user: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentPatch {
    pub content: Option<String>,
    pub post_id: Option<EntityId>,
    pub user: Option<UserRef>,
}

impl Entity for Comment {
    const KIND: EntityKind = EntityKind::Comment;
    type Patch = CommentPatch;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn merge(&mut self, patch: CommentPatch) {
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(post_id) = patch.post_id {
            self.post_id = Some(post_id);
        }
        if let Some(user) = patch.user {
            self.user = Some(user);
        }
        self.updated_at = Utc::now();
    }
}
