//! ``src/engine/sort.rs``
//! ============================================================================
//! # Sort Stage
//!
//! Stable ordering of filtered rows by one column. With no sort column the
//! rows pass through in inventory (discovery) order. Text columns compare
//! accent- and case-insensitively first, lowercase before uppercase as the
//! tie-break; numeric columns compare numerically.

use std::cmp::Ordering;

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{
    engine::row::RecordRef,
    model::query_state::{SortColumn, SortDirection, SortKey},
};

/// Locale-style comparison of two strings.
#[must_use]
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    primary_key(a)
        .cmp(&primary_key(b))
        .then_with(|| case_tiebreak(a, b))
        .then_with(|| a.cmp(b))
}

fn primary_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn case_tiebreak(a: &str, b: &str) -> Ordering {
    for (ca, cb) in a.nfd().zip(b.nfd()) {
        match (ca.is_uppercase(), cb.is_uppercase()) {
            (false, true) => return Ordering::Less,
            (true, false) => return Ordering::Greater,
            _ => {}
        }
    }
    Ordering::Equal
}

fn compare_keys(a: SortKey<'_>, b: SortKey<'_>) -> Ordering {
    match (a, b) {
        (SortKey::Text(a), SortKey::Text(b)) => locale_cmp(a, b),
        (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(&b),
        // A column always yields one key kind.
        _ => Ordering::Equal,
    }
}

/// Compare two rows on `column`; `Desc` reverses the sign only, so equal
/// keys stay equal and the stable sort keeps their input order.
#[must_use]
pub fn compare_rows<R: RecordRef>(
    a: &R,
    b: &R,
    column: SortColumn,
    direction: SortDirection,
) -> Ordering {
    let ordering = compare_keys(column.key(a.record()), column.key(b.record()));
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

pub fn sort_rows<R: RecordRef>(
    mut rows: Vec<R>,
    column: Option<SortColumn>,
    direction: SortDirection,
) -> Vec<R> {
    if let Some(column) = column {
        // `sort_by` is stable.
        rows.sort_by(|a, b| compare_rows(a, b, column, direction));
    }
    rows
}
