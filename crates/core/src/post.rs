use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::refs::{TagRef, UserRef};
use crate::types::{EntityId, EntityKind};

/// Visibility of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Privacy {
    Public,
    Friends,
    Private,
}

impl Privacy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Friends => "FRIENDS",
            Self::Private => "PRIVATE",
        }
    }
}

impl std::str::FromStr for Privacy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PUBLIC" => Ok(Self::Public),
            "FRIENDS" => Ok(Self::Friends),
            "PRIVATE" => Ok(Self::Private),
            other => Err(format!("unknown privacy: {other}")),
        }
    }
}

/// A user post: the one entity with multi-valued associations (tags and
/// attached file names) and therefore the one with a distinct eager
/// fetch path.
///
/// `files` is the attachment ledger: an ordered, append-only list of
/// stored blob names, with `num_files` as the cached count. The count is
/// always recomputed from the list length on mutation, never
/// incremented, so the two cannot drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Option<EntityId>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub location_name: Option<String>,
    pub location_lat: Option<f64>,
    pub location_long: Option<f64>,
    pub privacy: Privacy,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub comment_count: i64,
    pub share_count: i64,
    pub reaction_count: i64,
    pub user: Option<UserRef>,
    /// Multi-valued association; empty after a direct (non-eager) fetch.
    #[serde(default)]
    pub tags: Vec<TagRef>,
    /// Ordered stored blob names; empty after a direct fetch.
    #[serde(default)]
    pub files: Vec<String>,
    pub num_files: i32,
}

impl Post {
    /// A fresh, unpersisted post with zeroed counters and current
    /// timestamps.
    #[must_use]
    pub fn new(content: impl Into<String>, privacy: Privacy) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            content: content.into(),
            created_at: now,
            updated_at: now,
            location_name: None,
            location_lat: None,
            location_long: None,
            privacy,
            scheduled_at: None,
            view_count: 0,
            comment_count: 0,
            share_count: 0,
            reaction_count: 0,
            user: None,
            tags: Vec::new(),
            files: Vec::new(),
            num_files: 0,
        }
    }
}

/// Merge patch for [`Post`]. Only `Some` fields overwrite.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostPatch {
    pub content: Option<String>,
    pub location_name: Option<String>,
    pub location_lat: Option<f64>,
    pub location_long: Option<f64>,
    pub privacy: Option<Privacy>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub view_count: Option<i64>,
    pub comment_count: Option<i64>,
    pub share_count: Option<i64>,
    pub reaction_count: Option<i64>,
    pub user: Option<UserRef>,
    pub tags: Option<Vec<TagRef>>,
}

impl Entity for Post {
    const KIND: EntityKind = EntityKind::Post;
    type Patch = PostPatch;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn merge(&mut self, patch: PostPatch) {
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(name) = patch.location_name {
            self.location_name = Some(name);
        }
        if let Some(lat) = patch.location_lat {
            self.location_lat = Some(lat);
        }
        if let Some(long) = patch.location_long {
            self.location_long = Some(long);
        }
        if let Some(privacy) = patch.privacy {
            self.privacy = privacy;
        }
        if let Some(at) = patch.scheduled_at {
            self.scheduled_at = Some(at);
        }
        if let Some(n) = patch.view_count {
            self.view_count = n;
        }
        if let Some(n) = patch.comment_count {
            self.comment_count = n;
        }
        if let Some(n) = patch.share_count {
            self.share_count = n;
        }
        if let Some(n) = patch.reaction_count {
            self.reaction_count = n;
        }
        if let Some(user) = patch.user {
            self.user = Some(user);
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overwrites_only_populated_fields() {
        let mut post = Post::new("original", Privacy::Public);
        post.view_count = 7;

        post.merge(PostPatch {
            content: Some("patched".into()),
            privacy: Some(Privacy::Friends),
            ..Default::default()
        });

        assert_eq!(post.content, "patched");
        assert_eq!(post.privacy, Privacy::Friends);
        assert_eq!(post.view_count, 7, "untouched field must survive");
    }

    #[test]
    fn privacy_serializes_screaming_snake() {
        let json = serde_json::to_string(&Privacy::Friends).unwrap();
        assert_eq!(json, "\"FRIENDS\"");
    }

    #[test]
    fn missing_associations_deserialize_empty() {
        // A direct-fetch projection omits the multi-valued associations.
        let json = serde_json::json!({
            "id": 1,
            "content": "hello",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "location_name": null,
            "location_lat": null,
            "location_long": null,
            "privacy": "PUBLIC",
            "scheduled_at": null,
            "view_count": 0,
            "comment_count": 0,
            "share_count": 0,
            "reaction_count": 0,
            "user": null,
            "num_files": 0
        });
        let post: Post = serde_json::from_value(json).unwrap();
        assert!(post.tags.is_empty());
        assert!(post.files.is_empty());
    }
}
