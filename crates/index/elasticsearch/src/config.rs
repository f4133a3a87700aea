use serde::{Deserialize, Serialize};

use syncline_core::EntityKind;

/// Connection settings for the Elasticsearch index backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Base URL, e.g. `http://localhost:9200`.
    pub url: String,

    /// Optional basic-auth username.
    #[serde(default)]
    pub username: Option<String>,

    /// Optional basic-auth password.
    #[serde(default)]
    pub password: Option<String>,

    /// Prefix prepended to every collection's index name, e.g.
    /// `syncline-`. Empty by default.
    #[serde(default)]
    pub index_prefix: String,
}

impl ElasticsearchConfig {
    /// A config for the given URL with no auth and no prefix.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            index_prefix: String::new(),
        }
    }

    /// The index name for one entity kind.
    #[must_use]
    pub fn index_name(&self, kind: EntityKind) -> String {
        format!("{}{}", self.index_prefix, kind.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_name_applies_prefix() {
        let mut config = ElasticsearchConfig::new("http://localhost:9200");
        assert_eq!(config.index_name(EntityKind::Post), "posts");

        config.index_prefix = "syncline-".to_owned();
        assert_eq!(config.index_name(EntityKind::Post), "syncline-posts");
    }
}
