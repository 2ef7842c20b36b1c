//! Page number bookkeeping for the previous/next controls.
//!
//! The page is 1-based and never drops below 1. There is no upper bound:
//! the providers don't report one we trust, so paging past the end just
//! returns an empty page.
//!
//! [`Pagination::query`] is the only place a page number becomes a page size
//! and offset; both providers read those off the resulting [`PageQuery`].

use crate::models::{Category, PageQuery};

/// Default articles per page, shared by both providers.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    page_size: u32,
}

impl Pagination {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Jump to `page`; `0` is treated as `1`.
    pub fn go_to_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn next(&mut self) {
        self.page = self.page.saturating_add(1);
    }

    /// Step back one page. Returns `false` (and changes nothing) on page 1.
    pub fn previous(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Whether the "previous" control should be enabled.
    pub fn previous_enabled(&self) -> bool {
        self.page > 1
    }

    /// Zero-based index of the first article on the current page.
    pub fn current_offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    /// The request for the current page under `category`.
    pub fn query(&self, category: Category) -> PageQuery {
        PageQuery {
            category,
            page: self.page,
            page_size: self.page_size(),
            offset: self.current_offset(),
        }
    }

    /// Back to page 1, e.g. after the category filter changed.
    pub fn reset(&mut self) {
        self.page = 1;
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}
