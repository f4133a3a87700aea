use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::refs::UserRef;
use crate::types::{EntityId, EntityKind};

/// A notification addressed to a user. Delivery is out of scope here;
/// the record exists so it can be persisted and searched like every
/// other kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Option<EntityId>,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub user: Option<UserRef>,
}

impl Notification {
    #[must_use]
    pub fn new(message: impl Into<String>, user: UserRef) -> Self {
        Self {
            id: None,
            message: message.into(),
            read: false,
            created_at: Utc::now(),
            user: Some(user),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationPatch {
    pub message: Option<String>,
    pub read: Option<bool>,
    pub user: Option<UserRef>,
}

impl Entity for Notification {
    const KIND: EntityKind = EntityKind::Notification;
    type Patch = NotificationPatch;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn merge(&mut self, patch: NotificationPatch) {
        if let Some(message) = patch.message {
            self.message = message;
        }
        if let Some(read) = patch.read {
            self.read = read;
        }
        if let Some(user) = patch.user {
            self.user = Some(user);
        }
    }
}
