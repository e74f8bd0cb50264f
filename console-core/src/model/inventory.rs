//! ``src/model/inventory.rs``
//! ============================================================================
//! # `InventoryStore`: Last-Good Discovery Inventory
//!
//! Ordered collection of VM records in discovery order. A batch is validated
//! before it replaces the current records; a rejected batch or a failed fetch
//! leaves the previous records untouched.

use chrono::{DateTime, Utc};
use hashbrown::HashSet;
use tracing::{info, warn};

use crate::{
    error::AppError,
    model::vm::{VmId, VmRecord, VmStatus},
};

/// Header figures for the report view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventorySummary {
    pub total_vms: usize,
    pub total_clusters: usize,
    pub migratable: usize,
    pub with_warnings: usize,
    pub not_migratable: usize,
}

#[derive(Debug, Clone, Default)]
pub struct InventoryStore {
    records: Vec<VmRecord>,
    version: u64,
    loaded_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl InventoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> &[VmRecord] {
        &self.records
    }

    /// Bumped on every successful replace; keys derived-view caches.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub const fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded_at.is_some()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &VmId) -> Option<&VmRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Validate and install a freshly fetched batch.
    ///
    /// Ids must be unique and sizes non-negative; otherwise the batch is
    /// rejected and the current records are kept.
    pub fn replace(&mut self, records: Vec<VmRecord>) -> Result<(), AppError> {
        if let Err(e) = Self::validate(&records) {
            warn!(
                marker = "INVENTORY",
                operation_type = "inventory_rejected",
                error = %e,
                kept = self.records.len(),
                "Rejected inventory batch, keeping previous records"
            );
            self.last_error = Some(e.to_string());
            return Err(e);
        }

        info!(
            marker = "INVENTORY",
            operation_type = "inventory_replaced",
            count = records.len(),
            previous = self.records.len(),
            "Inventory updated"
        );

        self.records = records;
        self.version += 1;
        self.loaded_at = Some(Utc::now());
        self.last_error = None;
        Ok(())
    }

    /// Record a failed fetch without touching the loaded records.
    pub fn record_failure(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(
            marker = "INVENTORY",
            operation_type = "inventory_fetch_failed",
            kept = self.records.len(),
            "Inventory fetch failed: {message}"
        );
        self.last_error = Some(message);
    }

    #[must_use]
    pub fn summary(&self) -> InventorySummary {
        let clusters: HashSet<(&str, &str)> = self
            .records
            .iter()
            .map(|r| (r.datacenter.as_str(), r.cluster.as_str()))
            .collect();

        let mut summary = InventorySummary {
            total_vms: self.records.len(),
            total_clusters: clusters.len(),
            ..InventorySummary::default()
        };

        for record in &self.records {
            match record.status {
                VmStatus::Migratable => summary.migratable += 1,
                VmStatus::MigratableWithWarnings => summary.with_warnings += 1,
                VmStatus::NotMigratable => summary.not_migratable += 1,
            }
        }

        summary
    }

    fn validate(records: &[VmRecord]) -> Result<(), AppError> {
        let mut seen: HashSet<&VmId> = HashSet::with_capacity(records.len());
        for record in records {
            if !seen.insert(&record.id) {
                return Err(AppError::DuplicateVmId(record.id.clone()));
            }
            record
                .check_sizes()
                .map_err(|reason| AppError::invalid_record(record.id.clone(), reason))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::vm::fixtures::{sample_inventory, vm};

    #[test]
    fn replace_bumps_version_and_keeps_order() {
        let mut store = InventoryStore::new();
        assert!(!store.is_loaded());

        store.replace(sample_inventory()).unwrap();
        assert_eq!(store.version(), 1);
        assert!(store.is_loaded());
        assert_eq!(store.records()[0].name, "web-server-01");
        assert_eq!(store.records()[4].name, "monitoring-01");
    }

    #[test]
    fn duplicate_ids_keep_last_good_inventory() {
        let mut store = InventoryStore::new();
        store.replace(sample_inventory()).unwrap();

        let bad = vec![
            vm("vm-1", "a", VmStatus::Migratable, 1.0),
            vm("vm-1", "b", VmStatus::Migratable, 2.0),
        ];
        let err = store.replace(bad).unwrap_err();

        assert!(matches!(err, AppError::DuplicateVmId(ref id) if id.as_str() == "vm-1"));
        assert_eq!(store.len(), 5);
        assert_eq!(store.version(), 1);
        assert!(store.last_error().is_some());
    }

    #[test]
    fn failed_fetch_never_clears_records() {
        let mut store = InventoryStore::new();
        store.replace(sample_inventory()).unwrap();

        store.record_failure("connection refused");

        assert_eq!(store.len(), 5);
        assert_eq!(store.last_error(), Some("connection refused"));
    }

    #[test]
    fn summary_counts_statuses_and_clusters() {
        let mut records = sample_inventory();
        records[2].cluster = "Development-Cluster".into();
        let mut store = InventoryStore::new();
        store.replace(records).unwrap();

        let summary = store.summary();
        assert_eq!(summary.total_vms, 5);
        assert_eq!(summary.total_clusters, 2);
        assert_eq!(summary.migratable, 2);
        assert_eq!(summary.with_warnings, 2);
        assert_eq!(summary.not_migratable, 1);
    }
}
