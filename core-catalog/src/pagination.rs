//! Paging over children listings

use serde::{Deserialize, Serialize};

/// Window into a children listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (0-indexed)
    pub page: u32,
    /// Number of items per page
    pub page_size: u32,
}

impl PageRequest {
    /// Create a new page request
    ///
    /// # Examples
    ///
    /// ```
    /// use core_catalog::PageRequest;
    ///
    /// let request = PageRequest::new(1, 20);
    /// assert_eq!(request.offset(), 20);
    /// ```
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Index of the first item on this page.
    pub fn offset(&self) -> usize {
        (self.page as usize).saturating_mul(self.page_size as usize)
    }

    /// Items `[page * page_size, page * page_size + page_size)` of `items`,
    /// clamped to its bounds. Pages past the end are empty.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let start = self.offset().min(items.len());
        let end = start.saturating_add(self.page_size as usize).min(items.len());
        items[start..end].to_vec()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: 50,
        }
    }
}

/// One page of a listing together with its position in the whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub page_size: u32,
}

impl<T: Clone> Page<T> {
    /// Cuts the page described by `request` out of the full listing.
    pub fn from_listing(all: &[T], request: PageRequest) -> Self {
        Self::new(request.slice(all), all.len() as u64, request)
    }
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        let total_pages = if request.page_size == 0 {
            0
        } else {
            total.div_ceil(request.page_size as u64) as u32
        };

        Self {
            items,
            total,
            page: request.page,
            total_pages,
            page_size: request.page_size,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            total_pages: self.total_pages,
            page_size: self.page_size,
        }
    }
}
