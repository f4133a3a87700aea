use serde::{Deserialize, Serialize};

/// Stable numeric identity assigned by the record store.
///
/// Ids are backend-assigned on first save; an entity that has never been
/// persisted carries `None` in its `id` field.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl EntityId {
    /// Return the raw numeric value.
    #[must_use]
    pub fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The eleven indexable entity kinds.
///
/// The string form doubles as the record table name and the search index
/// collection name for the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Post,
    Comment,
    Reaction,
    Share,
    Favorite,
    Follow,
    Mention,
    Notification,
    File,
    Tag,
    User,
}

impl EntityKind {
    /// Every kind, in reconciliation order. The order carries no
    /// semantics; reconciliation is restartable per kind.
    pub const ALL: [EntityKind; 11] = [
        EntityKind::Post,
        EntityKind::Comment,
        EntityKind::Reaction,
        EntityKind::Share,
        EntityKind::Favorite,
        EntityKind::Follow,
        EntityKind::Mention,
        EntityKind::Notification,
        EntityKind::File,
        EntityKind::Tag,
        EntityKind::User,
    ];

    /// Return the canonical string form of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "posts",
            Self::Comment => "comments",
            Self::Reaction => "reactions",
            Self::Share => "shares",
            Self::Favorite => "favorites",
            Self::Follow => "follows",
            Self::Mention => "mentions",
            Self::Notification => "notifications",
            Self::File => "files",
            Self::Tag => "tags",
            Self::User => "users",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_is_transparent_in_json() {
        let id = EntityId(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: EntityId = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn kind_round_trips_through_as_str() {
        for kind in EntityKind::ALL {
            assert!(!kind.as_str().is_empty());
        }
        assert_eq!(EntityKind::Post.as_str(), "posts");
        assert_eq!(EntityKind::File.as_str(), "files");
    }
}
