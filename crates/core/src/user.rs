use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::types::{EntityId, EntityKind};

/// Minimal user record. Account management (credentials, activation,
/// authorities) lives outside this system; the user exists here because
/// it is one of the indexed kinds and the target of `UserRef`
/// projections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Option<EntityId>,
    pub login: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl User {
    #[must_use]
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            id: None,
            login: login.into(),
            first_name: None,
            last_name: None,
            email: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    pub login: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;
    type Patch = UserPatch;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn merge(&mut self, patch: UserPatch) {
        if let Some(login) = patch.login {
            self.login = login;
        }
        if let Some(name) = patch.first_name {
            self.first_name = Some(name);
        }
        if let Some(name) = patch.last_name {
            self.last_name = Some(name);
        }
        if let Some(email) = patch.email {
            self.email = Some(email);
        }
    }
}
