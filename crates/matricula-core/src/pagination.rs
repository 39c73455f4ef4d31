//! Record windows for paged review.

use std::ops::Range;

/// Records shown per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 3;

/// Page arithmetic for `total` records split into pages of `page_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    total: usize,
    page_size: usize,
}

impl Pagination {
    /// A page size of 0 is treated as 1.
    pub fn new(total: usize, page_size: usize) -> Self {
        Self {
            total,
            page_size: page_size.max(1),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// `ceil(total / page_size)`.
    pub fn num_pages(&self) -> usize {
        self.total.div_ceil(self.page_size)
    }

    /// Prev/next controls only make sense with more than one page.
    pub fn needs_controls(&self) -> bool {
        self.num_pages() > 1
    }

    /// Half-open window of record indices on `page`.
    ///
    /// Pages past the end yield the empty range `total..total`.
    pub fn visible_range(&self, page: usize) -> Range<usize> {
        let start = page.saturating_mul(self.page_size).min(self.total);
        let end = start.saturating_add(self.page_size).min(self.total);
        start..end
    }

    fn last_page(&self) -> usize {
        self.num_pages().saturating_sub(1)
    }
}

/// Current page of one document, clamped to `[0, num_pages - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pagination: Pagination,
    page: usize,
}

impl PageCursor {
    pub fn new(pagination: Pagination) -> Self {
        Self { pagination, page: 0 }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn prev(&mut self) -> usize {
        self.page = self.page.saturating_sub(1);
        self.page
    }

    pub fn next(&mut self) -> usize {
        self.page = (self.page + 1).min(self.pagination.last_page());
        self.page
    }

    pub fn goto(&mut self, page: usize) -> usize {
        self.page = page.min(self.pagination.last_page());
        self.page
    }

    /// Swap in new page arithmetic (re-upload with a different record count)
    /// keeping the current page where it is still in range.
    pub fn repaginate(&mut self, pagination: Pagination) {
        self.pagination = pagination;
        self.page = self.page.min(pagination.last_page());
    }

    pub fn visible_range(&self) -> Range<usize> {
        self.pagination.visible_range(self.page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seven_records_make_three_pages() {
        let p = Pagination::new(7, DEFAULT_PAGE_SIZE);
        assert_eq!(p.num_pages(), 3);
        assert_eq!(p.visible_range(0), 0..3);
        assert_eq!(p.visible_range(1), 3..6);
        assert_eq!(p.visible_range(2), 6..7);
    }

    #[test]
    fn windows_partition_all_records() {
        for total in 1..=20 {
            let p = Pagination::new(total, DEFAULT_PAGE_SIZE);
            assert_eq!(p.num_pages(), total.div_ceil(3));
            let mut covered = Vec::new();
            for page in 0..p.num_pages() {
                let range = p.visible_range(page);
                assert!(!range.is_empty(), "page {page} of {total} is empty");
                covered.extend(range);
            }
            assert_eq!(covered, (0..total).collect::<Vec<_>>());
        }
    }

    #[test]
    fn page_past_end_is_empty() {
        let p = Pagination::new(4, 3);
        assert_eq!(p.visible_range(5), 4..4);
        assert_eq!(p.visible_range(usize::MAX), 4..4);
    }

    #[test]
    fn single_page_needs_no_controls() {
        assert!(!Pagination::new(3, 3).needs_controls());
        assert!(!Pagination::new(1, 3).needs_controls());
        assert!(Pagination::new(4, 3).needs_controls());
    }

    #[test]
    fn zero_page_size_is_one() {
        let p = Pagination::new(2, 0);
        assert_eq!(p.num_pages(), 2);
        assert_eq!(p.visible_range(1), 1..2);
    }

    #[test]
    fn cursor_clamps_at_both_ends() {
        let mut c = PageCursor::new(Pagination::new(7, 3));
        assert_eq!(c.page(), 0);
        assert_eq!(c.prev(), 0);
        assert_eq!(c.next(), 1);
        assert_eq!(c.next(), 2);
        assert_eq!(c.next(), 2);
        assert_eq!(c.visible_range(), 6..7);
        assert_eq!(c.goto(99), 2);
        assert_eq!(c.prev(), 1);
    }

    #[test]
    fn repaginate_clamps_current_page() {
        let mut c = PageCursor::new(Pagination::new(9, 3));
        c.goto(2);
        c.repaginate(Pagination::new(4, 3));
        assert_eq!(c.page(), 1);
        c.repaginate(Pagination::new(12, 3));
        assert_eq!(c.page(), 1);
    }
}
