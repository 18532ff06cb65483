//! Page windows over key-ordered entity listings.

use serde::{Deserialize, Serialize};

/// Entities per page when the caller names only a page number.
pub const DEFAULT_PAGE_SIZE: u64 = 10;
/// Largest page a request may ask for.
pub const MAX_PAGE_SIZE: u64 = 100;

/// A 1-based page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-based).
    pub page: u64,
    /// Number of items per page.
    pub page_size: u64,
}

impl PageRequest {
    /// Create a page request, clamping the page to at least 1 and the size
    /// to `1..=MAX_PAGE_SIZE`.
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Page `page` of [`DEFAULT_PAGE_SIZE`] items. Pages below 1 read as 1.
    pub fn numbered(page: i64) -> Self {
        Self::new(u64::try_from(page).unwrap_or(1), DEFAULT_PAGE_SIZE)
    }

    /// Row offset of the first item, saturating at `i64::MAX`.
    pub fn offset(&self) -> i64 {
        let rows = self.page.saturating_sub(1).saturating_mul(self.page_size);
        i64::try_from(rows).unwrap_or(i64::MAX)
    }

    /// Maximum number of rows on the page.
    pub fn limit(&self) -> i64 {
        i64::try_from(self.page_size).unwrap_or(i64::MAX)
    }
}

/// One page of items together with listing totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    /// Never zero: an empty listing still has one (empty) page.
    pub total_pages: u64,
}

impl<T> PageResponse<T> {
    /// Wrap the items read for `request` out of `total_items`.
    pub fn new(items: Vec<T>, request: &PageRequest, total_items: u64) -> Self {
        let page_size = request.page_size.max(1);
        Self {
            items,
            page: request.page,
            page_size,
            total_items,
            total_pages: total_items.div_ceil(page_size).max(1),
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}
