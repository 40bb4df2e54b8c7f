//! Paging metadata and the page result envelope.

use serde::Serialize;

/// Page size used when the caller does not pass one.
pub const DEFAULT_ITEMS_PER_PAGE: i64 = 10;

/// Position of one page within a counted result set
///
/// `total_pages` is `ceil(total_items / items_per_page)`, so an empty result set has
/// zero pages and every page index is out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    /// 1-based
    pub page_index: u64,
    pub items_per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl Page {
    /// `items_per_page` must be at least 1.
    pub fn new(page_index: u64, items_per_page: u64, total_items: u64) -> Self {
        let items_per_page = items_per_page.max(1);
        Self {
            page_index,
            items_per_page,
            total_items,
            total_pages: total_items.div_ceil(items_per_page),
        }
    }

    /// Row offset of the first item on this page
    pub fn offset(&self) -> u64 {
        self.page_index
            .saturating_sub(1)
            .saturating_mul(self.items_per_page)
    }

    pub fn is_out_of_range(&self) -> bool {
        self.total_items == 0 || self.page_index == 0 || self.page_index > self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page_index > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_index < self.total_pages
    }
}

/// Items of one page together with its [`Page`] metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult<T> {
    pub page: Page,
    pub items: Vec<T>,
}

impl<T> PageResult<T> {
    pub fn empty(page: Page) -> Self {
        Self {
            page,
            items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}
