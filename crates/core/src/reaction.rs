use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::refs::UserRef;
use crate::types::{EntityId, EntityKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReactionKind {
    Like,
    Love,
    Haha,
    Wow,
    Sad,
    Angry,
}

impl ReactionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "LIKE",
            Self::Love => "LOVE",
            Self::Haha => "HAHA",
            Self::Wow => "WOW",
            Self::Sad => "SAD",
            Self::Angry => "ANGRY",
        }
    }
}

impl std::str::FromStr for ReactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIKE" => Ok(Self::Like),
            "LOVE" => Ok(Self::Love),
            "HAHA" => Ok(Self::Haha),
            "WOW" => Ok(Self::Wow),
            "SAD" => Ok(Self::Sad),
            "ANGRY" => Ok(Self::Angry),
            other => Err(format!("unknown reaction kind: {other}")),
        }
    }
}

/// A reaction left on a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub id: Option<EntityId>,
    pub kind: ReactionKind,
    pub reacted_at: DateTime<Utc>,
    pub post_id: Option<EntityId>,
    pub user: Option<UserRef>,
}

impl Reaction {
    #[must_use]
    pub fn new(kind: ReactionKind, post_id: EntityId) -> Self {
        Self {
            id: None,
            kind,
            reacted_at: Utc::now(),
            post_id: Some(post_id),
            user: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReactionPatch {
    pub kind: Option<ReactionKind>,
    pub reacted_at: Option<DateTime<Utc>>,
    pub post_id: Option<EntityId>,
    pub user: Option<UserRef>,
}

impl Entity for Reaction {
    const KIND: EntityKind = EntityKind::Reaction;
    type Patch = ReactionPatch;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn merge(&mut self, patch: ReactionPatch) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(at) = patch.reacted_at {
            self.reacted_at = at;
        }
        if let Some(post_id) = patch.post_id {
            self.post_id = Some(post_id);
        }
        if let Some(user) = patch.user {
            self.user = Some(user);
        }
    }
}
