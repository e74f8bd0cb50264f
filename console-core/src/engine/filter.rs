//! ``src/engine/filter.rs``
//! ============================================================================
//! # Filter Stage
//!
//! Keeps rows whose name contains the search text (case-insensitive) and whose
//! status is admitted by the status filter. Pure and order-preserving.

use crate::{
    engine::row::RecordRef,
    model::query_state::{QueryState, StatusFilter},
};

/// Borrowed filter inputs with the search text lowered once up front.
#[derive(Debug, Clone)]
pub struct FilterCriteria<'q> {
    needle: String,
    statuses: &'q StatusFilter,
}

impl<'q> FilterCriteria<'q> {
    #[must_use]
    pub fn new(search: &str, statuses: &'q StatusFilter) -> Self {
        Self {
            needle: search.to_lowercase(),
            statuses,
        }
    }

    #[must_use]
    pub fn from_query(query: &'q QueryState) -> Self {
        Self::new(query.search(), query.status_filter())
    }

    #[must_use]
    pub fn matches<R: RecordRef>(&self, row: &R) -> bool {
        let record = row.record();
        if !self.statuses.admits(record.status) {
            return false;
        }
        self.needle.is_empty() || record.name.to_lowercase().contains(&self.needle)
    }
}

pub fn filter_rows<R, I>(rows: I, criteria: &FilterCriteria<'_>) -> Vec<R>
where
    R: RecordRef,
    I: IntoIterator<Item = R>,
{
    rows.into_iter().filter(|row| criteria.matches(row)).collect()
}
