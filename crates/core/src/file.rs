use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::types::{EntityId, EntityKind};

/// Metadata record for one stored blob attached to a post.
///
/// `file_name` is the generated stored name under the blob store root;
/// the binary content itself never passes through the record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Option<EntityId>,
    pub file_name: String,
    pub file_url: String,
    pub mime_type: String,
    pub file_size: i64,
    pub uploaded_at: DateTime<Utc>,
    pub post_id: Option<EntityId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilePatch {
    pub file_name: Option<String>,
    pub file_url: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<i64>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub post_id: Option<EntityId>,
}

impl Entity for FileRecord {
    const KIND: EntityKind = EntityKind::File;
    type Patch = FilePatch;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn merge(&mut self, patch: FilePatch) {
        if let Some(name) = patch.file_name {
            self.file_name = name;
        }
        if let Some(url) = patch.file_url {
            self.file_url = url;
        }
        if let Some(mime) = patch.mime_type {
            self.mime_type = mime;
        }
        if let Some(size) = patch.file_size {
            self.file_size = size;
        }
        if let Some(at) = patch.uploaded_at {
            self.uploaded_at = at;
        }
        if let Some(post_id) = patch.post_id {
            self.post_id = Some(post_id);
        }
    }
}
