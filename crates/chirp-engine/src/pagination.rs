//! Pagination over query results.
//!
//! Pages are 1-indexed. `has_next`/`has_prev` are derived from the total so
//! they stay correct at page 1, at the last page, and when the total is an
//! exact multiple of the page size.

use serde::Serialize;

/// One page of results plus the totals needed to render pagination links.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Total items across all pages
    pub total: usize,
    /// Current page (1-indexed)
    pub page: usize,
    /// Page size
    pub per_page: usize,
}

impl<T> Paginated<T> {
    /// An empty result set.
    pub fn empty(page: usize, per_page: usize) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: page.max(1),
            per_page,
        }
    }

    /// Paginate an already-ordered full result list.
    pub fn from_all(all: Vec<T>, page: usize, per_page: usize) -> Self {
        let total = all.len();
        let page = page.max(1);
        let start = (page - 1).saturating_mul(per_page);
        let items = if start >= total {
            Vec::new()
        } else {
            all.into_iter().skip(start).take(per_page).collect()
        };
        Self {
            items,
            total,
            page,
            per_page,
        }
    }

    /// Number of pages.
    pub fn pages(&self) -> usize {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page)
    }

    /// True if a later page exists.
    pub fn has_next(&self) -> bool {
        self.page.saturating_mul(self.per_page) < self.total
    }

    /// True if an earlier page exists.
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}
