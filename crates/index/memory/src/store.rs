use async_trait::async_trait;
use dashmap::DashMap;

use syncline_core::projection::sort_rows;
use syncline_core::{Entity, EntityId, Page, PageRequest};
use syncline_index::{IndexError, SearchIndex, matches, parse_query};

/// One in-memory search collection.
///
/// Documents live in a concurrent map keyed by record id; `index` is a
/// plain upsert, so reconciliation re-runs are idempotent by
/// construction. Search parses the query, filters every document
/// through the evaluator, sorts by the requested clauses over the JSON
/// projection, and slices one page with the total computed before
/// slicing.
#[derive(Debug)]
pub struct MemorySearchIndex<D: Entity> {
    docs: DashMap<i64, D>,
}

impl<D: Entity> MemorySearchIndex<D> {
    /// Create a new, empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            docs: DashMap::new(),
        }
    }

    /// Number of documents currently indexed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the collection holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Ids of every indexed document, for reconciliation diffing.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.docs.iter().map(|entry| EntityId(*entry.key())).collect()
    }
}

impl<D: Entity> Default for MemorySearchIndex<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<D: Entity> SearchIndex<D> for MemorySearchIndex<D> {
    async fn search(&self, query: &str, page: &PageRequest) -> Result<Page<D>, IndexError> {
        let expr = parse_query(query)?;

        let mut matching: Vec<D> = Vec::new();
        for entry in self.docs.iter() {
            let projection = serde_json::to_value(entry.value())
                .map_err(|e| IndexError::Serialization(e.to_string()))?;
            if matches(&expr, &projection) {
                matching.push(entry.value().clone());
            }
        }
        // Deterministic base order before any requested sort.
        matching.sort_by_key(|doc| doc.id().map_or(i64::MAX, EntityId::value));

        let sorted = sort_rows(matching, &page.sort);
        let total = sorted.len() as u64;
        let items: Vec<D> = sorted
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.effective_size() as usize)
            .collect();
        Ok(Page::new(items, total, page))
    }

    async fn index(&self, doc: &D) -> Result<(), IndexError> {
        let Some(id) = doc.id() else {
            return Err(IndexError::Storage(
                "cannot index a document without an id".to_owned(),
            ));
        };
        self.docs.insert(id.value(), doc.clone());
        Ok(())
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<(), IndexError> {
        self.docs.remove(&id.value());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use syncline_core::{EntityId, PageRequest, Post, Privacy, SortClause, TagRef};
    use syncline_index::SearchIndex;

    use super::MemorySearchIndex;

    fn doc(id: i64, content: &str, privacy: Privacy, tags: &[&str]) -> Post {
        let mut post = Post::new(content, privacy);
        post.id = Some(EntityId(id));
        post.tags = tags
            .iter()
            .enumerate()
            .map(|(n, name)| TagRef::new(n as i64 + 1, *name))
            .collect();
        post
    }

    #[tokio::test]
    async fn index_is_an_upsert() {
        let index = MemorySearchIndex::new();
        index
            .index(&doc(1, "first", Privacy::Public, &[]))
            .await
            .unwrap();
        index
            .index(&doc(1, "second", Privacy::Public, &[]))
            .await
            .unwrap();

        assert_eq!(index.len(), 1);
        let page = index.search("second", &PageRequest::of(0, 10)).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn delete_tolerates_absence() {
        let index = MemorySearchIndex::<Post>::new();
        index.delete_by_id(EntityId(99)).await.unwrap();
    }

    #[tokio::test]
    async fn field_terms_only_match_their_field() {
        let index = MemorySearchIndex::new();
        index
            .index(&doc(1, "coffee time", Privacy::Public, &[]))
            .await
            .unwrap();
        index
            .index(&doc(2, "beach day", Privacy::Friends, &["coffee"]))
            .await
            .unwrap();

        let page = index
            .search("content:coffee", &PageRequest::of(0, 10))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, Some(EntityId(1)));

        let page = index
            .search("tags.name:coffee", &PageRequest::of(0, 10))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, Some(EntityId(2)));
    }

    #[tokio::test]
    async fn search_pages_and_sorts() {
        let index = MemorySearchIndex::new();
        for (id, content) in [(1, "banana"), (2, "apple"), (3, "cherry")] {
            index
                .index(&doc(id, content, Privacy::Public, &[]))
                .await
                .unwrap();
        }

        let page = index
            .search(
                "",
                &PageRequest::of(0, 2).sorted_by(SortClause::asc("content")),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        let contents: Vec<&str> = page.items.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["apple", "banana"]);
    }

    #[tokio::test]
    async fn boolean_queries_compose() {
        let index = MemorySearchIndex::new();
        index
            .index(&doc(1, "coffee morning", Privacy::Public, &[]))
            .await
            .unwrap();
        index
            .index(&doc(2, "coffee evening", Privacy::Private, &[]))
            .await
            .unwrap();

        let page = index
            .search("coffee AND privacy:PUBLIC", &PageRequest::of(0, 10))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, Some(EntityId(1)));
    }
}
