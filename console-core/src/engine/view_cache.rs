//! ``src/engine/view_cache.rs``
//! ============================================================================
//! # `ViewCache`: Memoized Filter → Sort Output
//!
//! The filtered and sorted row order is cached under a key made of the
//! inventory version and the query parameters that feed those two stages.
//! Page and page-size changes only re-window the cached order.

use tracing::debug;

use crate::{
    engine::{
        filter::{FilterCriteria, filter_rows},
        paginate::{page_count, window},
        sort::sort_rows,
    },
    model::{
        inventory::InventoryStore,
        query_state::{QueryState, SortColumn, SortDirection, StatusFilter},
        vm::{VmId, VmRecord},
    },
};

/// Filter then sort, without caching.
#[must_use]
pub fn ordered_rows<'a>(records: &'a [VmRecord], query: &QueryState) -> Vec<&'a VmRecord> {
    let criteria = FilterCriteria::from_query(query);
    let filtered = filter_rows(records.iter(), &criteria);
    sort_rows(filtered, query.sort_column(), query.sort_direction())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    records_version: u64,
    search: String,
    statuses: StatusFilter,
    sort_column: Option<SortColumn>,
    sort_direction: SortDirection,
}

impl CacheKey {
    fn new(inventory: &InventoryStore, query: &QueryState) -> Self {
        Self {
            records_version: inventory.version(),
            search: query.search().to_owned(),
            statuses: query.status_filter().clone(),
            sort_column: query.sort_column(),
            sort_direction: query.sort_direction(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ViewCache {
    key: Option<CacheKey>,
    /// Inventory positions in filtered + sorted order.
    order: Vec<usize>,
    recomputes: u64,
}

impl ViewCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the ordered rows if the key changed. Returns whether it did.
    pub fn refresh(&mut self, inventory: &InventoryStore, query: &QueryState) -> bool {
        let key = CacheKey::new(inventory, query);
        if self.key.as_ref() == Some(&key) {
            return false;
        }

        let criteria = FilterCriteria::from_query(query);
        let filtered = filter_rows(inventory.records().iter().enumerate(), &criteria);
        let sorted = sort_rows(filtered, key.sort_column, key.sort_direction);

        self.order = sorted.into_iter().map(|(pos, _)| pos).collect();
        self.recomputes += 1;

        debug!(
            marker = "VIEW_CACHE",
            operation_type = "view_recompute",
            records_version = key.records_version,
            rows = self.order.len(),
            "Recomputed inventory view"
        );

        self.key = Some(key);
        true
    }

    #[must_use]
    pub fn filtered_len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn page_count(&self, query: &QueryState) -> usize {
        page_count(self.order.len(), query.page_size())
    }

    #[must_use]
    pub const fn recomputes(&self) -> u64 {
        self.recomputes
    }

    /// All filtered rows in display order.
    #[must_use]
    pub fn ordered<'a>(&self, inventory: &'a InventoryStore) -> Vec<&'a VmRecord> {
        let records = inventory.records();
        self.order.iter().filter_map(|&pos| records.get(pos)).collect()
    }

    /// Rows on the current page.
    #[must_use]
    pub fn page_rows<'a>(
        &self,
        inventory: &'a InventoryStore,
        query: &QueryState,
    ) -> Vec<&'a VmRecord> {
        let records = inventory.records();
        let range = window(self.order.len(), query.page(), query.page_size());
        self.order[range]
            .iter()
            .filter_map(|&pos| records.get(pos))
            .collect()
    }

    /// Ids on the current page, for the selection manager.
    #[must_use]
    pub fn visible_ids(&self, inventory: &InventoryStore, query: &QueryState) -> Vec<VmId> {
        self.page_rows(inventory, query)
            .into_iter()
            .map(|r| r.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::vm::{
        VmStatus,
        fixtures::{names, sample_inventory},
    };
    use std::num::NonZeroUsize;

    fn loaded() -> InventoryStore {
        let mut store = InventoryStore::new();
        store.replace(sample_inventory()).unwrap();
        store
    }

    #[test]
    fn end_to_end_filter_sort_paginate() {
        let store = loaded();

        let mut query = QueryState::default();
        query.toggle_status(VmStatus::NotMigratable);
        assert_eq!(names(ordered_rows(store.records(), &query)), vec!["app-server-01"]);

        let mut query = QueryState::with_page_size(NonZeroUsize::new(2).unwrap());
        query.set_sort(Some(SortColumn::DiskSize), SortDirection::Desc);
        assert_eq!(
            names(ordered_rows(store.records(), &query)),
            vec![
                "db-server-01",
                "web-server-01",
                "monitoring-01",
                "app-server-01",
                "cache-server-01"
            ]
        );

        let mut cache = ViewCache::new();
        cache.refresh(&store, &query);
        assert_eq!(
            names(cache.page_rows(&store, &query)),
            vec!["db-server-01", "web-server-01"]
        );
        query.set_page(3);
        assert_eq!(names(cache.page_rows(&store, &query)), vec!["cache-server-01"]);
        assert_eq!(cache.page_count(&query), 3);
    }

    #[test]
    fn page_changes_do_not_recompute() {
        let store = loaded();
        let mut query = QueryState::with_page_size(NonZeroUsize::new(2).unwrap());
        let mut cache = ViewCache::new();

        assert!(cache.refresh(&store, &query));
        query.set_page(2);
        assert!(!cache.refresh(&store, &query));
        query.set_page_size(NonZeroUsize::new(3).unwrap());
        assert!(!cache.refresh(&store, &query));
        assert_eq!(cache.recomputes(), 1);

        query.set_search("server");
        assert!(cache.refresh(&store, &query));
        assert_eq!(cache.recomputes(), 2);
    }

    #[test]
    fn new_inventory_version_recomputes() {
        let mut store = loaded();
        let query = QueryState::default();
        let mut cache = ViewCache::new();
        cache.refresh(&store, &query);

        let mut records = sample_inventory();
        records.truncate(2);
        store.replace(records).unwrap();

        assert!(cache.refresh(&store, &query));
        assert_eq!(cache.filtered_len(), 2);
    }

    #[test]
    fn cached_order_matches_pure_pipeline() {
        let store = loaded();
        let mut query = QueryState::default();
        query.set_search("SERVER");
        query.set_sort(Some(SortColumn::Name), SortDirection::Asc);

        let mut cache = ViewCache::new();
        cache.refresh(&store, &query);

        assert_eq!(cache.ordered(&store), ordered_rows(store.records(), &query));
    }
}
