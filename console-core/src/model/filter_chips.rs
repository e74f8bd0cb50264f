//! ``src/model/filter_chips.rs``
//! ============================================================================
//! # Toolbar Filter Chips
//!
//! Chips and the status menu are computed from `QueryState` on every render.
//! Removing a chip goes through the same mutators the filter stage reads, so
//! there is no second copy of the filter to drift.

use crate::model::{query_state::QueryState, vm::VmStatus};

pub const STATUS_CATEGORY: &str = "Status";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterChip {
    pub category: &'static str,
    pub status: VmStatus,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMenuItem {
    pub status: VmStatus,
    pub label: &'static str,
    pub selected: bool,
}

/// Chips for the active status filter, in the order the statuses were added.
#[must_use]
pub fn status_chips(query: &QueryState) -> Vec<FilterChip> {
    query
        .status_filter()
        .iter()
        .map(|status| FilterChip {
            category: STATUS_CATEGORY,
            status,
            label: status.label(),
        })
        .collect()
}

/// Entries of the "Filters" dropdown with their checked state.
#[must_use]
pub fn status_menu(query: &QueryState) -> [StatusMenuItem; 3] {
    VmStatus::ALL.map(|status| StatusMenuItem {
        status,
        label: status.label(),
        selected: query.status_filter().contains(status),
    })
}

/// Remove the chip with the given label. Unknown labels are ignored.
pub fn delete_chip(query: &mut QueryState, label: &str) -> bool {
    VmStatus::from_label(label).is_some_and(|status| query.remove_status(status))
}

/// "Clear all filters".
pub fn delete_chip_group(query: &mut QueryState) {
    query.clear_status_filter();
}
