//! Pagination control layout
//!
//! Produces the sequence of page buttons and ellipses shown under a list:
//! two edge pages at each end, two siblings on each side of the current page,
//! and the full range when it fits.

use serde::{Deserialize, Serialize};

const SIBLING_COUNT: i64 = 2;
const EDGE_COUNT: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageItem {
    Page { number: u32, current: bool },
    Ellipsis,
}

impl PageItem {
    pub fn number(&self) -> Option<u32> {
        match self {
            PageItem::Page { number, .. } => Some(*number),
            PageItem::Ellipsis => None,
        }
    }
}

/// Number of pages needed for `total_items`
pub fn total_pages(total_items: u64, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    let pages = total_items.div_ceil(u64::from(per_page));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

pub fn has_prev(current: u32) -> bool {
    current > 1
}

pub fn has_next(current: u32, total_pages: u32) -> bool {
    current < total_pages
}

/// Layout of the pagination control
///
/// `current` is clamped into `1..=total_pages`. An empty list yields no items.
pub fn page_items(total_pages: u32, current: u32) -> Vec<PageItem> {
    let total = i64::from(total_pages);
    let current = i64::from(current.clamp(1, total_pages.max(1)));
    let page = |n: i64| PageItem::Page {
        number: n as u32,
        current: n == current,
    };

    if total <= EDGE_COUNT * 2 + SIBLING_COUNT * 2 + 1 {
        return (1..=total).map(page).collect();
    }

    let siblings_start = (current - SIBLING_COUNT)
        .min(total - EDGE_COUNT - SIBLING_COUNT * 2)
        .max(EDGE_COUNT + 1);
    let siblings_end = (current + SIBLING_COUNT)
        .max(EDGE_COUNT + SIBLING_COUNT * 2 + 1)
        .min(total - EDGE_COUNT);

    let mut items: Vec<PageItem> = (1..=EDGE_COUNT).map(page).collect();
    if siblings_start > EDGE_COUNT + 1 {
        items.push(PageItem::Ellipsis);
    }
    items.extend((siblings_start..=siblings_end).map(page));
    if siblings_end < total - EDGE_COUNT {
        items.push(PageItem::Ellipsis);
    }
    items.extend((total - EDGE_COUNT + 1..=total).map(page));
    items
}
