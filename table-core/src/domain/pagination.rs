//! # Pagination
//!
//! Computes the page buttons shown under the table and clamps page requests
//! into the range the last result set reported.

use serde::{Deserialize, Serialize};

use super::models::PageMeta;

pub const DEFAULT_MAX_VISIBLE_PAGES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

/// Window of page buttons around `current_page`.
///
/// With `last_page <= max_visible` every page is listed. Otherwise a window of
/// `max_visible` pages is centered on the current page and shifted to stay
/// inside `[1, last_page]`; page 1 and `last_page` are added outside the
/// window, separated by an ellipsis when pages are skipped.
pub fn compute_window(current_page: u32, last_page: u32, max_visible: u32) -> Vec<PageItem> {
    let last_page = last_page.max(1);
    let max_visible = max_visible.max(1);
    let current_page = current_page.clamp(1, last_page);

    if last_page <= max_visible {
        return (1..=last_page).map(PageItem::Page).collect();
    }

    let half = max_visible / 2;
    let mut start = current_page.saturating_sub(half).max(1);
    let mut end = start.saturating_add(max_visible - 1);
    if end >= last_page {
        end = last_page;
        start = last_page - max_visible + 1;
    }

    let mut items = Vec::with_capacity(max_visible as usize + 4);
    if start > 1 {
        items.push(PageItem::Page(1));
        if start > 2 {
            items.push(PageItem::Ellipsis);
        }
    }
    items.extend((start..=end).map(PageItem::Page));
    if end < last_page {
        if end < last_page - 1 {
            items.push(PageItem::Ellipsis);
        }
        items.push(PageItem::Page(last_page));
    }
    items
}

/// First and last row index shown, plus the collection total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSummary {
    pub from: u64,
    pub to: u64,
    pub total: u64,
}

/// Page navigation derived from the latest `PageMeta`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationController {
    meta: PageMeta,
    max_visible: u32,
}

impl PaginationController {
    pub fn new(meta: PageMeta, max_visible: u32) -> Self {
        Self { meta, max_visible }
    }

    pub fn page_count(&self) -> u32 {
        self.meta.last_page.max(1)
    }

    pub fn current_page(&self) -> u32 {
        self.meta.current_page.clamp(1, self.page_count())
    }

    /// Out-of-range requests are clamped, not rejected
    pub fn clamp(&self, requested: u32) -> u32 {
        requested.clamp(1, self.page_count())
    }

    pub fn has_previous(&self) -> bool {
        self.current_page() > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page() < self.page_count()
    }

    pub fn window(&self) -> Vec<PageItem> {
        compute_window(self.current_page(), self.page_count(), self.max_visible)
    }

    /// "Showing 11 to 20 of 53"; `from` and `to` are 0 for an empty collection
    pub fn range_summary(&self, rows_on_page: usize) -> RangeSummary {
        if self.meta.total == 0 || rows_on_page == 0 {
            return RangeSummary { from: 0, to: 0, total: self.meta.total };
        }
        let offset = (self.current_page() as u64 - 1) * self.meta.per_page as u64;
        RangeSummary {
            from: offset + 1,
            to: (offset + rows_on_page as u64).min(self.meta.total),
            total: self.meta.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageItem::{Ellipsis, Page};

    #[test]
    fn test_small_collections_list_every_page() {
        assert_eq!(compute_window(2, 4, 5), vec![Page(1), Page(2), Page(3), Page(4)]);
        assert_eq!(compute_window(1, 1, 5), vec![Page(1)]);
        assert_eq!(compute_window(1, 0, 5), vec![Page(1)]);
    }

    #[test]
    fn test_window_in_the_middle_has_both_ellipses() {
        assert_eq!(
            compute_window(10, 20, 5),
            vec![Page(1), Ellipsis, Page(8), Page(9), Page(10), Page(11), Page(12), Ellipsis, Page(20)]
        );
    }

    #[test]
    fn test_window_clamped_at_start() {
        assert_eq!(
            compute_window(1, 20, 5),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Ellipsis, Page(20)]
        );
    }

    #[test]
    fn test_window_clamped_at_end() {
        assert_eq!(
            compute_window(20, 20, 5),
            vec![Page(1), Ellipsis, Page(16), Page(17), Page(18), Page(19), Page(20)]
        );
    }

    #[test]
    fn test_adjacent_edges_get_no_ellipsis() {
        assert_eq!(
            compute_window(4, 20, 5),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Page(6), Ellipsis, Page(20)]
        );
        assert_eq!(
            compute_window(17, 20, 5),
            vec![Page(1), Ellipsis, Page(15), Page(16), Page(17), Page(18), Page(19), Page(20)]
        );
    }

    #[test]
    fn test_window_near_u32_max_does_not_overflow() {
        let max = u32::MAX;
        assert_eq!(
            compute_window(max, max, 5),
            vec![Page(1), Ellipsis, Page(max - 4), Page(max - 3), Page(max - 2), Page(max - 1), Page(max)]
        );
    }

    #[test]
    fn test_controller_clamps_requests() {
        let meta = PageMeta { current_page: 2, last_page: 6, per_page: 10, total: 53 };
        let pagination = PaginationController::new(meta, DEFAULT_MAX_VISIBLE_PAGES);

        assert_eq!(pagination.clamp(0), 1);
        assert_eq!(pagination.clamp(99), 6);
        assert!(pagination.has_previous());
        assert!(pagination.has_next());
    }

    #[test]
    fn test_range_summary() {
        let meta = PageMeta { current_page: 6, last_page: 6, per_page: 10, total: 53 };
        let pagination = PaginationController::new(meta, 5);
        assert_eq!(pagination.range_summary(3), RangeSummary { from: 51, to: 53, total: 53 });

        let empty = PaginationController::new(PageMeta::empty(10), 5);
        assert_eq!(empty.range_summary(0), RangeSummary { from: 0, to: 0, total: 0 });
        assert!(!empty.has_next());
    }
}
