use std::marker::PhantomData;

use async_trait::async_trait;

use syncline_core::page::SortDirection;
use syncline_core::{Entity, EntityId, Page, PageRequest};
use syncline_index::{IndexError, SearchIndex};

use crate::config::ElasticsearchConfig;

/// Elasticsearch-backed [`SearchIndex`] for one entity kind.
///
/// Documents are PUT at `/{index}/_doc/{id}`, making `index` a pure
/// upsert; deletes treat 404 as success. The index is created with its
/// mapping at construction if it does not already exist.
pub struct ElasticsearchIndex<D: Entity> {
    client: reqwest::Client,
    base_url: String,
    index: String,
    username: Option<String>,
    password: Option<String>,
    _kind: PhantomData<fn() -> D>,
}

impl<D: Entity> ElasticsearchIndex<D> {
    /// Create a new collection handle, ensuring the backing index
    /// exists.
    pub async fn new(config: &ElasticsearchConfig) -> Result<Self, IndexError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| IndexError::Storage(e.to_string()))?;

        let store = Self {
            client,
            base_url: config.url.trim_end_matches('/').to_owned(),
            index: config.index_name(D::KIND),
            username: config.username.clone(),
            password: config.password.clone(),
            _kind: PhantomData,
        };

        store.ensure_index().await?;
        Ok(store)
    }

    /// Build a request for the given method and path, applying basic
    /// authentication when credentials are configured.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{path}", self.base_url);
        let mut req = self.client.request(method, &url);
        if let Some(ref user) = self.username {
            req = req.basic_auth(user, self.password.as_deref());
        }
        req
    }

    /// Create the index if absent. A `400 Bad Request` carrying
    /// `resource_already_exists_exception` is treated as success.
    async fn ensure_index(&self) -> Result<(), IndexError> {
        let mapping = serde_json::json!({
            "mappings": {
                "properties": {
                    "id": { "type": "long" }
                }
            }
        });

        let resp = self
            .request(reqwest::Method::PUT, &self.index)
            .json(&mapping)
            .send()
            .await
            .map_err(|e| IndexError::Storage(e.to_string()))?;

        if resp.status().is_success() || resp.status() == reqwest::StatusCode::BAD_REQUEST {
            tracing::debug!(index = %self.index, "elasticsearch index ensured");
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(IndexError::Storage(format!(
                "failed to create index '{}': {body}",
                self.index
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Elasticsearch response types (internal)
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
struct SearchResponse<D> {
    hits: SearchHits<D>,
}

#[derive(serde::Deserialize)]
struct SearchHits<D> {
    total: HitsTotal,
    hits: Vec<SearchHit<D>>,
}

#[derive(serde::Deserialize)]
struct HitsTotal {
    value: u64,
}

#[derive(serde::Deserialize)]
struct SearchHit<D> {
    #[serde(rename = "_source")]
    source: D,
}

// ---------------------------------------------------------------------------
// Query body builder
// ---------------------------------------------------------------------------

/// Build the `_search` request body for a query expression and page.
///
/// The expression goes to `query_string` untouched (Elasticsearch
/// implements the same grammar); an empty expression becomes
/// `match_all`. Sort clauses map onto the request order, and
/// `track_total_hits` keeps the total exact for pagination headers.
fn build_search_body(query: &str, page: &PageRequest) -> serde_json::Value {
    let es_query = if query.trim().is_empty() {
        serde_json::json!({ "match_all": {} })
    } else {
        serde_json::json!({ "query_string": { "query": query } })
    };

    let mut body = serde_json::json!({
        "query": es_query,
        "from": page.offset(),
        "size": page.effective_size(),
        "track_total_hits": true
    });

    if !page.sort.is_empty() {
        let clauses: Vec<serde_json::Value> = page
            .sort
            .iter()
            .map(|clause| {
                let order = match clause.direction {
                    SortDirection::Asc => "asc",
                    SortDirection::Desc => "desc",
                };
                let mut entry = serde_json::Map::new();
                entry.insert(
                    clause.field.clone(),
                    serde_json::json!({ "order": order }),
                );
                serde_json::Value::Object(entry)
            })
            .collect();
        body["sort"] = serde_json::Value::Array(clauses);
    }

    body
}

// ---------------------------------------------------------------------------
// SearchIndex implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl<D: Entity> SearchIndex<D> for ElasticsearchIndex<D> {
    async fn search(&self, query: &str, page: &PageRequest) -> Result<Page<D>, IndexError> {
        let body = build_search_body(query, page);
        let path = format!("{}/_search", self.index);

        let resp = self
            .request(reqwest::Method::POST, &path)
            .json(&body)
            .send()
            .await
            .map_err(|e| IndexError::Storage(e.to_string()))?;

        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(IndexError::Storage(format!("search failed: {text}")));
        }

        let search: SearchResponse<D> = resp
            .json()
            .await
            .map_err(|e| IndexError::Serialization(e.to_string()))?;

        let items: Vec<D> = search.hits.hits.into_iter().map(|h| h.source).collect();
        Ok(Page::new(items, search.hits.total.value, page))
    }

    async fn index(&self, doc: &D) -> Result<(), IndexError> {
        let Some(id) = doc.id() else {
            return Err(IndexError::Storage(
                "cannot index a document without an id".to_owned(),
            ));
        };
        let path = format!("{}/_doc/{id}", self.index);

        let resp = self
            .request(reqwest::Method::PUT, &path)
            .json(doc)
            .send()
            .await
            .map_err(|e| IndexError::Storage(e.to_string()))?;

        if resp.status().is_success() {
            tracing::debug!(index = %self.index, %id, "document indexed");
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(IndexError::Storage(format!(
                "failed to index document: {body}"
            )))
        }
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<(), IndexError> {
        let path = format!("{}/_doc/{id}", self.index);

        let resp = self
            .request(reqwest::Method::DELETE, &path)
            .send()
            .await
            .map_err(|e| IndexError::Storage(e.to_string()))?;

        // Absence is not an error.
        if resp.status().is_success() || resp.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(IndexError::Storage(format!(
                "failed to delete document {id}: {body}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use syncline_core::{PageRequest, SortClause};

    use super::build_search_body;

    #[test]
    fn empty_query_becomes_match_all() {
        let body = build_search_body("  ", &PageRequest::of(0, 20));
        assert_eq!(body["query"], serde_json::json!({ "match_all": {} }));
        assert_eq!(body["track_total_hits"], serde_json::json!(true));
    }

    #[test]
    fn query_string_passes_through_untouched() {
        let body = build_search_body("content:coffee AND privacy:PUBLIC", &PageRequest::of(0, 20));
        assert_eq!(
            body["query"]["query_string"]["query"],
            serde_json::json!("content:coffee AND privacy:PUBLIC")
        );
    }

    #[test]
    fn paging_and_sort_map_onto_from_size_sort() {
        let page = PageRequest::of(2, 25).sorted_by(SortClause::desc("created_at"));
        let body = build_search_body("x", &page);
        assert_eq!(body["from"], serde_json::json!(50));
        assert_eq!(body["size"], serde_json::json!(25));
        assert_eq!(
            body["sort"],
            serde_json::json!([{ "created_at": { "order": "desc" } }])
        );
    }
}
