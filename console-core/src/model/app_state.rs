// console-core/src/model/app_state.rs
// AppState: everything the controller mutates and the renderer reads

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument};

use crate::{
    config::Config,
    engine::view_cache::ViewCache,
    model::{
        agent::AgentState,
        export::{ExportMenuItem, deep_inspection_enabled, export_menu},
        inventory::{InventoryStore, InventorySummary},
        lifecycle::{CollectionLifecycle, CollectorStatus},
        login_form::LoginForm,
        query_state::{DEFAULT_PAGE_SIZE, QueryState},
        selection::{SelectAllState, SelectionSet},
        ui_state::UIState,
        vm::{VmId, VmRecord},
    },
};

/// Top-level screen, derived from the session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Credentials entry and collection progress.
    Login,
    /// Inventory report of a collected session.
    Report,
}

#[derive(Debug)]
pub struct AppState {
    pub config: Arc<Config>, // Application configuration

    pub inventory: InventoryStore,
    pub query: QueryState,
    pub selection: SelectionSet,
    pub lifecycle: CollectionLifecycle,
    pub agent: AgentState,
    pub login: LoginForm,
    pub ui: UIState,

    view: ViewCache,

    pub started_at: Instant, // State creation timestamp
}

impl AppState {
    #[instrument(level = "info", skip(config))]
    pub fn new(config: Arc<Config>) -> Self {
        let page_size = NonZeroUsize::new(config.table.page_size).unwrap_or(DEFAULT_PAGE_SIZE);

        Self {
            config,
            inventory: InventoryStore::new(),
            query: QueryState::with_page_size(page_size),
            selection: SelectionSet::new(),
            lifecycle: CollectionLifecycle::new(),
            agent: AgentState::default(),
            login: LoginForm::new(),
            ui: UIState::new(),
            view: ViewCache::new(),
            started_at: Instant::now(),
        }
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        if self.lifecycle.status() == CollectorStatus::Collected && self.inventory.is_loaded() {
            Screen::Report
        } else {
            Screen::Login
        }
    }

    /// Bring the cached view up to date; clamps page and cursor afterwards.
    #[instrument(level = "trace", skip(self))]
    pub fn refresh_view(&mut self) -> bool {
        let recomputed = self.view.refresh(&self.inventory, &self.query);

        let pages = self.view.page_count(&self.query);
        if self.query.page() > pages {
            debug!(
                marker = "QUERY",
                page = self.query.page(),
                pages,
                "Clamping page after view change"
            );
            self.query.set_page(pages);
        }

        let page_len = self.page_rows().len();
        self.ui.clamp_cursor(page_len);
        recomputed
    }

    #[must_use]
    pub fn page_rows(&self) -> Vec<&VmRecord> {
        self.view.page_rows(&self.inventory, &self.query)
    }

    #[must_use]
    pub fn visible_ids(&self) -> Vec<VmId> {
        self.view.visible_ids(&self.inventory, &self.query)
    }

    #[must_use]
    pub fn filtered_len(&self) -> usize {
        self.view.filtered_len()
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.view.page_count(&self.query)
    }

    #[must_use]
    pub const fn view_recomputes(&self) -> u64 {
        self.view.recomputes()
    }

    /// Navigate to `page`, clamped to `1..=page_count`.
    pub fn go_to_page(&mut self, page: usize) {
        let page = page.clamp(1, self.page_count());
        if page != self.query.page() {
            self.query.set_page(page);
            self.ui.cursor = 0;
        }
    }

    #[must_use]
    pub fn cursor_record(&self) -> Option<&VmRecord> {
        self.page_rows().get(self.ui.cursor).copied()
    }

    /// Toggle the row under the cursor; returns its new selection state.
    pub fn toggle_cursor_row(&mut self) -> Option<bool> {
        let id = self.cursor_record()?.id.clone();
        Some(self.selection.toggle(&id))
    }

    #[must_use]
    pub fn header_state(&self) -> SelectAllState {
        let visible = self.visible_ids();
        self.selection.header_state(visible.iter())
    }

    /// Header checkbox semantics: a fully selected page is cleared, otherwise
    /// the whole page is selected.
    pub fn toggle_select_all_visible(&mut self) {
        let visible = self.visible_ids();
        let select = !self.selection.is_all_visible_selected(visible.iter());
        self.selection.select_all_visible(visible.iter(), select);
    }

    #[must_use]
    pub fn summary(&self) -> InventorySummary {
        self.inventory.summary()
    }

    #[must_use]
    pub fn export_menu(&self) -> [ExportMenuItem; 2] {
        export_menu(&self.inventory)
    }

    #[must_use]
    pub fn deep_inspection_enabled(&self) -> bool {
        deep_inspection_enabled(&self.selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        lifecycle::{LifecycleEvent, StatusReport},
        query_state::{SortColumn, SortDirection},
        vm::{VmStatus, fixtures::sample_inventory},
    };

    fn collected_state(page_size: usize) -> AppState {
        let mut config = Config::default();
        config.table.page_size = page_size;
        let mut app = AppState::new(Arc::new(config));

        app.lifecycle.apply(LifecycleEvent::Attach);
        let generation = app.lifecycle.generation();
        app.lifecycle.apply(LifecycleEvent::StatusSynced {
            generation,
            report: StatusReport::new(CollectorStatus::Collected),
        });
        app.inventory.replace(sample_inventory()).unwrap();
        app.refresh_view();
        app
    }

    #[test]
    fn report_screen_needs_collected_inventory() {
        let app = AppState::new(Arc::new(Config::default()));
        assert_eq!(app.screen(), Screen::Login);

        let app = collected_state(20);
        assert_eq!(app.screen(), Screen::Report);
    }

    #[test]
    fn search_edit_resets_page_without_losing_selection() {
        let mut app = collected_state(2);
        app.go_to_page(3);
        assert_eq!(app.query.page(), 3);

        app.toggle_cursor_row();
        let selected = app.selection.ids();
        assert_eq!(selected.len(), 1);

        app.query.set_search("server");
        app.refresh_view();
        assert_eq!(app.query.page(), 1);
        assert_eq!(app.selection.ids(), selected);
    }

    #[test]
    fn select_all_visible_only_touches_current_page() {
        let mut app = collected_state(2);
        app.query
            .set_sort(Some(SortColumn::DiskSize), SortDirection::Desc);
        app.refresh_view();

        app.toggle_select_all_visible();
        assert_eq!(app.header_state(), SelectAllState::Checked);
        assert_eq!(app.selection.len(), 2);

        app.go_to_page(2);
        assert_eq!(app.header_state(), SelectAllState::Unchecked);
        app.ui.cursor = 1;
        app.toggle_cursor_row();
        assert_eq!(app.header_state(), SelectAllState::Indeterminate);

        app.go_to_page(1);
        app.toggle_select_all_visible();
        assert_eq!(app.selection.len(), 1);
        assert!(app.selection.contains(&VmId::from("vm-1003")));
    }

    #[test]
    fn hidden_rows_stay_selected_and_deselect_all_skips_them() {
        let mut app = collected_state(20);
        app.toggle_select_all_visible();
        assert_eq!(app.selection.len(), 5);

        app.query.toggle_status(VmStatus::NotMigratable);
        app.refresh_view();
        assert_eq!(app.visible_ids(), vec![VmId::from("vm-1003")]);
        assert_eq!(app.selection.len(), 5);
        assert_eq!(app.header_state(), SelectAllState::Checked);

        app.toggle_select_all_visible();
        assert!(!app.selection.contains(&VmId::from("vm-1003")));
        assert_eq!(
            app.selection.ids(),
            ["vm-1001", "vm-1002", "vm-1004", "vm-1005"].map(VmId::from)
        );

        app.query.clear_status_filter();
        app.refresh_view();
        assert_eq!(app.header_state(), SelectAllState::Indeterminate);
    }

    #[test]
    fn page_navigation_clamps_and_does_not_recompute() {
        let mut app = collected_state(2);
        let before = app.view_recomputes();

        app.go_to_page(99);
        assert_eq!(app.query.page(), 3);
        app.go_to_page(0);
        assert_eq!(app.query.page(), 1);
        app.refresh_view();
        assert_eq!(app.view_recomputes(), before);
    }

    #[test]
    fn narrowing_filter_clamps_page() {
        let mut app = collected_state(2);
        app.go_to_page(3);
        app.query.toggle_status(VmStatus::NotMigratable);
        app.query.set_page(3);
        app.refresh_view();
        assert_eq!(app.query.page(), 1);
        assert_eq!(app.page_rows().len(), 1);
    }

    #[test]
    fn report_affordances_follow_inventory_and_selection() {
        let mut app = collected_state(20);
        assert!(app.export_menu().iter().all(|item| item.enabled));
        assert!(!app.deep_inspection_enabled());

        app.toggle_cursor_row();
        assert!(app.deep_inspection_enabled());
    }
}
