//! Pagination math shared by the post-listing endpoints.

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Normalized pagination input (1-based page, bounded page size).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Applies defaults and bounds to raw query parameters.
    #[must_use]
    pub fn normalize(page: Option<i64>, page_size: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// A resolved page: the request clamped against the actual row count.
///
/// When the requested page exceeds the last page, the last page is served
/// instead of an empty result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl Page {
    #[must_use]
    pub fn clamp(request: PageRequest, total_items: i64) -> Self {
        let total_items = total_items.max(0);
        let total_pages = (total_items + request.page_size - 1) / request.page_size;
        let total_pages = total_pages.max(1);
        Self {
            page: request.page.min(total_pages),
            page_size: request.page_size,
            total_items,
            total_pages,
        }
    }

    /// SQL OFFSET for this page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}
