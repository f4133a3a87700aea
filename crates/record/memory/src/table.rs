use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use syncline_core::projection::sort_rows;
use syncline_core::{Entity, EntityId, Page, PageRequest};
use syncline_record::{RecordError, Repository};

/// One entity kind's rows in memory: a concurrent map plus a monotonic
/// id counter standing in for the database sequence.
///
/// A single generic [`Repository`] implementation covers all eleven
/// kinds; pagination and sorting run over each row's JSON projection so
/// the behavior matches the other backends field-for-field.
#[derive(Debug)]
pub struct MemoryTable<E: Entity> {
    rows: DashMap<i64, E>,
    next_id: AtomicI64,
}

impl<E: Entity> MemoryTable<E> {
    /// Create a new, empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Run a closure against a row under the map's entry lock.
    pub(crate) fn with_row_mut<R>(
        &self,
        id: EntityId,
        f: impl FnOnce(&mut E) -> R,
    ) -> Option<R> {
        self.rows.get_mut(&id.value()).map(|mut row| f(&mut row))
    }

    pub(crate) fn get(&self, id: EntityId) -> Option<E> {
        self.rows.get(&id.value()).map(|row| row.clone())
    }

    /// All rows in id order, before any request-driven sort.
    pub(crate) fn snapshot(&self) -> Vec<E> {
        let mut rows: Vec<E> = self.rows.iter().map(|row| row.clone()).collect();
        rows.sort_by_key(|row| row.id().map_or(i64::MAX, EntityId::value));
        rows
    }

    /// Sort, then slice one page out of the given rows. An empty sort
    /// keeps the incoming order (id order for `snapshot` rows).
    pub(crate) fn paginate(rows: Vec<E>, page: &PageRequest) -> Page<E> {
        let sorted = sort_rows(rows, &page.sort);
        let total = sorted.len() as u64;
        let items: Vec<E> = sorted
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.effective_size() as usize)
            .collect();
        Page::new(items, total, page)
    }
}

impl<E: Entity> Default for MemoryTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for MemoryTable<E> {
    async fn save(&self, mut entity: E) -> Result<E, RecordError> {
        match entity.id() {
            None => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                entity.set_id(EntityId(id));
                self.rows.insert(id, entity.clone());
                Ok(entity)
            }
            Some(id) => {
                if !self.rows.contains_key(&id.value()) {
                    return Err(RecordError::not_found(E::KIND, id));
                }
                self.rows.insert(id.value(), entity.clone());
                Ok(entity)
            }
        }
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<E>, RecordError> {
        Ok(self.get(id))
    }

    async fn find_page(&self, page: &PageRequest) -> Result<Page<E>, RecordError> {
        Ok(Self::paginate(self.snapshot(), page))
    }

    async fn find_all(&self) -> Result<Vec<E>, RecordError> {
        Ok(self.snapshot())
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RecordError> {
        Ok(self.rows.remove(&id.value()).is_some())
    }
}

#[cfg(test)]
mod tests {
    use syncline_core::{SortClause, Tag};
    use syncline_record::testing::run_repository_conformance_tests;

    use super::MemoryTable;
    use syncline_record::Repository;

    #[tokio::test]
    async fn conformance() {
        let table = MemoryTable::<Tag>::new();
        run_repository_conformance_tests(&table, |n| Tag::new(format!("tag-{n}")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn page_sorts_by_requested_field() {
        let table = MemoryTable::<Tag>::new();
        for name in ["pear", "apple", "mango"] {
            table.save(Tag::new(name)).await.unwrap();
        }

        let page = table
            .find_page(
                &syncline_core::PageRequest::of(0, 10).sorted_by(SortClause::asc("name")),
            )
            .await
            .unwrap();

        let names: Vec<&str> = page.items.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["apple", "mango", "pear"]);
    }
}
