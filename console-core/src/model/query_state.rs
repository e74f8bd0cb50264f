//! ``src/model/query_state.rs``
//! ============================================================================
//! # `QueryState`: Inventory View Parameters
//!
//! Search text, status filter, sort column/direction and pagination for the
//! VM table. Fields are private so the page-reset rules cannot be bypassed:
//! editing the search, the status filter or the page size always returns the
//! view to page 1.

use std::{fmt, num::NonZeroUsize};

use indexmap::IndexSet;

use crate::model::vm::{VmRecord, VmStatus};

pub const DEFAULT_PAGE_SIZE: NonZeroUsize = NonZeroUsize::new(20).unwrap();

/// Sortable table columns. A closed set, so an unknown column cannot exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortColumn {
    Name,
    Status,
    Datacenter,
    Cluster,
    DiskSize,
    MemorySize,
}

/// Extracted value a column sorts on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortKey<'a> {
    Text(&'a str),
    Number(f64),
}

impl SortColumn {
    pub const ALL: [Self; 6] = [
        Self::Name,
        Self::Status,
        Self::Datacenter,
        Self::Cluster,
        Self::DiskSize,
        Self::MemorySize,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Status => "Status",
            Self::Datacenter => "Data center",
            Self::Cluster => "Cluster",
            Self::DiskSize => "Disk size",
            Self::MemorySize => "Memory size",
        }
    }

    #[must_use]
    pub fn key(self, record: &VmRecord) -> SortKey<'_> {
        match self {
            Self::Name => SortKey::Text(&record.name),
            Self::Status => SortKey::Text(record.status.as_str()),
            Self::Datacenter => SortKey::Text(&record.datacenter),
            Self::Cluster => SortKey::Text(&record.cluster),
            Self::DiskSize => SortKey::Number(record.disk_size_gb),
            Self::MemorySize => SortKey::Number(record.memory_size_gb),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

/// Insertion-ordered set of statuses; empty means "no status filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusFilter(IndexSet<VmStatus>);

impl StatusFilter {
    #[must_use]
    pub fn contains(&self, status: VmStatus) -> bool {
        self.0.contains(&status)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether a record passes. An empty filter admits everything.
    #[must_use]
    pub fn admits(&self, status: VmStatus) -> bool {
        self.0.is_empty() || self.0.contains(&status)
    }

    pub fn iter(&self) -> impl Iterator<Item = VmStatus> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<VmStatus> for StatusFilter {
    fn from_iter<I: IntoIterator<Item = VmStatus>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    search: String,
    status_filter: StatusFilter,
    sort_column: Option<SortColumn>,
    sort_direction: SortDirection,
    page: NonZeroUsize,
    page_size: NonZeroUsize,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl QueryState {
    #[must_use]
    pub fn with_page_size(page_size: NonZeroUsize) -> Self {
        Self {
            search: String::new(),
            status_filter: StatusFilter::default(),
            sort_column: None,
            sort_direction: SortDirection::Asc,
            page: NonZeroUsize::MIN,
            page_size,
        }
    }

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    #[must_use]
    pub const fn status_filter(&self) -> &StatusFilter {
        &self.status_filter
    }

    #[must_use]
    pub const fn sort_column(&self) -> Option<SortColumn> {
        self.sort_column
    }

    #[must_use]
    pub const fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    #[must_use]
    pub const fn page(&self) -> usize {
        self.page.get()
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size.get()
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.reset_page();
    }

    pub fn push_search_char(&mut self, ch: char) {
        self.search.push(ch);
        self.reset_page();
    }

    pub fn pop_search_char(&mut self) {
        if self.search.pop().is_some() {
            self.reset_page();
        }
    }

    /// Add the status if absent, remove it if present.
    pub fn toggle_status(&mut self, status: VmStatus) {
        if !self.status_filter.0.shift_remove(&status) {
            self.status_filter.0.insert(status);
        }
        self.reset_page();
    }

    pub fn remove_status(&mut self, status: VmStatus) -> bool {
        let removed = self.status_filter.0.shift_remove(&status);
        if removed {
            self.reset_page();
        }
        removed
    }

    pub fn clear_status_filter(&mut self) {
        self.status_filter.0.clear();
        self.reset_page();
    }

    pub fn set_sort(&mut self, column: Option<SortColumn>, direction: SortDirection) {
        self.sort_column = column;
        self.sort_direction = direction;
    }

    /// Header click: same column flips direction, a new column sorts ascending.
    pub fn toggle_sort(&mut self, column: SortColumn) {
        if self.sort_column == Some(column) {
            self.sort_direction = self.sort_direction.flipped();
        } else {
            self.sort_column = Some(column);
            self.sort_direction = SortDirection::Asc;
        }
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = NonZeroUsize::new(page).unwrap_or(NonZeroUsize::MIN);
    }

    pub fn set_page_size(&mut self, page_size: NonZeroUsize) {
        self.page_size = page_size;
        self.reset_page();
    }

    const fn reset_page(&mut self) {
        self.page = NonZeroUsize::MIN;
    }
}
