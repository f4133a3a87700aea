use serde::{Deserialize, Serialize};

/// Sort direction for a single sort clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One `field,direction` pair of a sort order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortClause {
    pub field: String,
    pub direction: SortDirection,
}

impl SortClause {
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Pagination parameters: zero-based page number, page size, sort order.
///
/// A size of `0` means "use the default"; callers should read the size
/// through [`PageRequest::effective_size`], which clamps to `1..=1000`
/// and defaults to 20.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    #[serde(default)]
    pub sort: Vec<SortClause>,
}

impl PageRequest {
    /// A request for the given page with the given size and no sort.
    #[must_use]
    pub fn of(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            sort: Vec::new(),
        }
    }

    /// Add a sort clause, keeping any earlier clauses ahead of it.
    #[must_use]
    pub fn sorted_by(mut self, clause: SortClause) -> Self {
        self.sort.push(clause);
        self
    }

    /// The page size clamped to `1..=1000`, defaulting to 20 when unset.
    #[must_use]
    pub fn effective_size(&self) -> u32 {
        match self.size {
            0 => 20,
            n => n.min(1000),
        }
    }

    /// Number of rows to skip before this page starts.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.effective_size())
    }
}

/// One page of results plus the total hit count across all pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

impl<T> Page<T> {
    /// Build a page echoing the request's page/size.
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, request: &PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            size: request.effective_size(),
        }
    }

    /// An empty page for the given request.
    #[must_use]
    pub fn empty(request: &PageRequest) -> Self {
        Self::new(Vec::new(), 0, request)
    }

    /// Map the items, preserving paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_size_defaults_and_clamps() {
        assert_eq!(PageRequest::of(0, 0).effective_size(), 20);
        assert_eq!(PageRequest::of(0, 50).effective_size(), 50);
        assert_eq!(PageRequest::of(0, 5000).effective_size(), 1000);
    }

    #[test]
    fn offset_multiplies_page_by_size() {
        assert_eq!(PageRequest::of(0, 10).offset(), 0);
        assert_eq!(PageRequest::of(3, 25).offset(), 75);
    }

    #[test]
    fn page_map_preserves_metadata() {
        let req = PageRequest::of(2, 5);
        let page = Page::new(vec![1, 2, 3], 13, &req);
        let mapped = page.map(|n| n * 2);
        assert_eq!(mapped.items, vec![2, 4, 6]);
        assert_eq!(mapped.total, 13);
        assert_eq!(mapped.page, 2);
        assert_eq!(mapped.size, 5);
    }
}
