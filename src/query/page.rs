//! Pagination.
//!
//! `skip`/`limit` apply first, then `page`/`perPage` slice the remainder:
//!
//! ```text
//! filtered ──skip/limit──▶ window ──page/perPage──▶ items
//!   total_count             total_pages = max(1, ceil(window / perPage))
//! ```

use crate::error::{StoreError, StoreResult};
use serde::Serialize;
use serde_json::Value;

/// Requested slice of a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    pub skip: usize,
    pub limit: Option<usize>,
    /// 1-based; 0 is read as 1
    pub page: usize,
    /// `None` or `Some(0)` disables paging
    pub per_page: Option<usize>,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: None,
            page: 1,
            per_page: None,
        }
    }
}

impl PageSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn per_page(mut self, per_page: usize) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Read a count argument (`skip`, `limit`, `page`, `perPage`).
    pub(crate) fn count_arg(name: &str, value: &Value) -> StoreResult<usize> {
        value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| {
                StoreError::InvalidQuery(format!("`{name}` must be a non-negative integer, got {value}"))
            })
    }
}

/// Position of a page within the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total_pages: usize,
    pub current_page: usize,
    pub per_page: Option<usize>,
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub is_first: bool,
    pub is_last: bool,
}

/// Slice `items` according to `spec`.
pub fn paginate<T>(items: Vec<T>, spec: &PageSpec) -> (Vec<T>, PageInfo) {
    let window = items
        .into_iter()
        .skip(spec.skip)
        .take(spec.limit.unwrap_or(usize::MAX));
    let current_page = spec.page.max(1);

    let (items, total_pages, per_page) = match spec.per_page.filter(|&n| n > 0) {
        Some(per_page) => {
            let window: Vec<T> = window.collect();
            let total_pages = window.len().div_ceil(per_page).max(1);
            let offset = (current_page - 1).saturating_mul(per_page);
            let items = window.into_iter().skip(offset).take(per_page).collect();
            (items, total_pages, Some(per_page))
        }
        None => (window.collect(), 1, None),
    };

    let info = PageInfo {
        total_pages,
        current_page,
        per_page,
        has_previous_page: current_page > 1,
        has_next_page: current_page < total_pages,
        is_first: current_page == 1,
        is_last: current_page >= total_pages,
    };
    (items, info)
}
