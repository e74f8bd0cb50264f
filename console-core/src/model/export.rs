//! ``src/model/export.rs``
//!
//! Report actions whose availability depends on the inventory or the
//! selection. Both are acknowledged with a notification only.

use crate::model::{inventory::InventoryStore, selection::SelectionSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Csv,
}

impl ExportFormat {
    pub const ALL: [Self; 2] = [Self::Pdf, Self::Csv];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pdf => "Export as PDF",
            Self::Csv => "Export as CSV",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportMenuItem {
    pub format: ExportFormat,
    pub enabled: bool,
}

/// Export entries are enabled once at least one record is loaded.
#[must_use]
pub fn export_menu(inventory: &InventoryStore) -> [ExportMenuItem; 2] {
    let enabled = !inventory.is_empty();
    ExportFormat::ALL.map(|format| ExportMenuItem { format, enabled })
}

#[must_use]
pub fn deep_inspection_enabled(selection: &SelectionSet) -> bool {
    !selection.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::vm::{VmId, fixtures::sample_inventory};

    #[test]
    fn export_needs_records() {
        let mut store = InventoryStore::new();
        assert!(export_menu(&store).iter().all(|item| !item.enabled));

        store.replace(sample_inventory()).unwrap();
        assert!(export_menu(&store).iter().all(|item| item.enabled));
    }

    #[test]
    fn deep_inspection_needs_selection() {
        let mut selection = SelectionSet::new();
        assert!(!deep_inspection_enabled(&selection));
        selection.select_one(&VmId::from("vm-1001"), true);
        assert!(deep_inspection_enabled(&selection));
    }
}
