//! ``src/model/selection.rs``
//! ============================================================================
//! # `SelectionSet`: Sticky Row Selection
//!
//! Keyed by VM id and independent of the query pipeline. An id stays selected
//! while it is filtered out or paged away; the "visible" operations only ever
//! touch the ids passed in for the current page.

use hashbrown::HashSet;

use crate::model::vm::VmId;

/// Header checkbox state for "select all on this page".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAllState {
    Checked,
    Indeterminate,
    Unchecked,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    ids: HashSet<VmId>,
}

impl SelectionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_one(&mut self, id: &VmId, selected: bool) {
        if selected {
            self.ids.insert(id.clone());
        } else {
            self.ids.remove(id);
        }
    }

    /// Flip a single row.
    pub fn toggle(&mut self, id: &VmId) -> bool {
        let now_selected = !self.ids.contains(id);
        self.select_one(id, now_selected);
        now_selected
    }

    /// Select or deselect exactly the ids on the current page.
    pub fn select_all_visible<'a, I>(&mut self, visible: I, selected: bool)
    where
        I: IntoIterator<Item = &'a VmId>,
    {
        for id in visible {
            self.select_one(id, selected);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    #[must_use]
    pub fn contains(&self, id: &VmId) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// True only for a non-empty page whose rows are all selected.
    #[must_use]
    pub fn is_all_visible_selected<'a, I>(&self, visible: I) -> bool
    where
        I: IntoIterator<Item = &'a VmId>,
    {
        let mut any = false;
        for id in visible {
            if !self.ids.contains(id) {
                return false;
            }
            any = true;
        }
        any
    }

    #[must_use]
    pub fn is_any_visible_selected<'a, I>(&self, visible: I) -> bool
    where
        I: IntoIterator<Item = &'a VmId>,
    {
        visible.into_iter().any(|id| self.ids.contains(id))
    }

    #[must_use]
    pub fn header_state<'a, I>(&self, visible: I) -> SelectAllState
    where
        I: IntoIterator<Item = &'a VmId> + Clone,
    {
        if self.is_all_visible_selected(visible.clone()) {
            SelectAllState::Checked
        } else if self.is_any_visible_selected(visible) {
            SelectAllState::Indeterminate
        } else {
            SelectAllState::Unchecked
        }
    }

    /// Selected ids in a stable order.
    #[must_use]
    pub fn ids(&self) -> Vec<VmId> {
        let mut ids: Vec<VmId> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }
}
