//! Offset pagination utilities.

use serde::{Deserialize, Serialize};

/// Default number of rows per listing page.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Upper bound on a client-requested page size.
pub const MAX_PER_PAGE: u32 = 100;

/// A normalized page request. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// Builds a page request from optional query values, clamping them into range.
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    /// Row offset for SQL `OFFSET`.
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    /// Row count for SQL `LIMIT`.
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination metadata returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PageInfo {
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: u32,
}

impl PageInfo {
    pub fn new(request: PageRequest, total: i64) -> Self {
        let total = total.max(0);
        let per_page = i64::from(request.per_page);
        let total_pages = ((total + per_page - 1) / per_page) as u32;
        Self {
            page: request.page,
            per_page: request.per_page,
            total,
            total_pages,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}
