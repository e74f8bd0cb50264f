//! ``src/engine/paginate.rs``
//!
//! Pagination stage: a half-open window over already sorted rows.

use std::ops::Range;

/// `[(page-1)*page_size, page*page_size)` clipped to `len`; empty past the end.
#[must_use]
pub fn window(len: usize, page: usize, page_size: usize) -> Range<usize> {
    let start = page
        .saturating_sub(1)
        .saturating_mul(page_size)
        .min(len);
    let end = start.saturating_add(page_size).min(len);
    start..end
}

#[must_use]
pub fn paginate<T>(rows: &[T], page: usize, page_size: usize) -> &[T] {
    &rows[window(rows.len(), page, page_size)]
}

/// Number of pages; an empty result still has one (empty) page.
#[must_use]
pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    len.div_ceil(page_size).max(1)
}
