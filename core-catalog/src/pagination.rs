//! Client-side pagination over a loaded product list

use core_runtime::config::DEFAULT_CATALOG_PAGE_SIZE;
use serde::{Deserialize, Serialize};

/// Pagination request parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Current page number (0-indexed)
    pub page: usize,
    /// Number of items per page
    pub page_size: usize,
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }

    /// Index of the first item on this page
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_CATALOG_PAGE_SIZE,
        }
    }
}

/// One page of items plus navigation metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: usize,
    /// Current page number
    pub page: usize,
    /// Total number of pages
    pub total_pages: usize,
    /// Number of items per page
    pub page_size: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page.saturating_add(1) < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    /// Map the items to a different type
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

/// Slice `items` into the requested page.
///
/// A page past the end yields no items; a zero page size yields no pages.
pub fn paginate<T: Clone>(items: &[T], request: PageRequest) -> Page<T> {
    let total = items.len();
    let total_pages = if request.page_size == 0 {
        0
    } else {
        total.div_ceil(request.page_size)
    };

    let start = request.offset().min(total);
    let end = start.saturating_add(request.page_size).min(total);

    Page {
        items: items[start..end].to_vec(),
        total,
        page: request.page,
        total_pages,
        page_size: request.page_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page_size_is_twelve() {
        let request = PageRequest::default();
        assert_eq!(request.page, 0);
        assert_eq!(request.page_size, 12);
    }

    #[test]
    fn test_paginate_slices() {
        let items: Vec<u32> = (0..30).collect();

        let first = paginate(&items, PageRequest::default());
        assert_eq!(first.items, (0..12).collect::<Vec<_>>());
        assert_eq!(first.total_pages, 3);
        assert!(first.has_next());
        assert!(!first.has_previous());

        let last = paginate(&items, PageRequest::new(2, 12));
        assert_eq!(last.items, (24..30).collect::<Vec<_>>());
        assert!(!last.has_next());
        assert!(last.has_previous());
    }

    #[test]
    fn test_paginate_out_of_range_and_empty() {
        let items: Vec<u32> = (0..5).collect();
        let beyond = paginate(&items, PageRequest::new(4, 12));
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total_pages, 1);

        let empty = paginate::<u32>(&[], PageRequest::default());
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next());

        let zero = paginate(&items, PageRequest::new(0, 0));
        assert_eq!(zero.total_pages, 0);
        assert!(zero.items.is_empty());
    }

    #[test]
    fn test_last_possible_page_has_no_next() {
        let page = paginate(&[1, 2, 3], PageRequest::new(usize::MAX, 12));
        assert!(page.items.is_empty());
        assert!(!page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn test_page_map() {
        let page = paginate(&[1, 2, 3], PageRequest::new(0, 2)).map(|x| x * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.total, 3);
    }
}
