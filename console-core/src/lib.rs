pub mod error;

pub mod config;

pub mod api {
    pub mod client;
    pub use client::{CollectorApi, HttpCollectorClient};
}

pub mod controller {

    pub mod actions;
    pub use actions::Action;

    pub mod action_dispatcher;
    pub use action_dispatcher::ActionDispatcher;

    pub mod event_loop;
    pub use event_loop::{EventLoop, TaskResult};
}

pub mod engine {
    pub mod row;

    pub mod filter;

    pub mod sort;

    pub mod paginate;

    pub mod view_cache;
    pub use view_cache::ViewCache;
}

pub mod model {
    pub mod agent;

    pub mod app_state;

    pub mod export;

    pub mod filter_chips;

    pub mod inventory;
    pub use inventory::{InventoryStore, InventorySummary};

    pub mod lifecycle;
    pub use lifecycle::{CollectionLifecycle, CollectorStatus};

    pub mod login_form;

    pub mod query_state;
    pub use query_state::{QueryState, SortColumn, SortDirection};

    pub mod selection;
    pub use selection::{SelectAllState, SelectionSet};

    pub mod ui_state;
    pub use ui_state::{Notification, NotificationLevel, RedrawFlag, UIMode, UIOverlay, UIState};

    pub mod vm;
    pub use vm::{VmId, VmRecord, VmStatus};
}

pub mod tasks {
    pub mod collector_task;
}

pub mod view {
    pub mod theme;

    pub mod ui;

    pub mod components {
        pub mod help_overlay;
        pub use help_overlay::HelpOverlay;
        pub mod login_panel;
        pub use login_panel::LoginPanel;
        pub mod menu_overlay;
        pub use menu_overlay::MenuOverlay;
        pub mod notification_overlay;
        pub use notification_overlay::NotificationOverlay;
        pub mod status_bar;
        pub use status_bar::StatusBar;
        pub mod toolbar;
        pub use toolbar::Toolbar;
        pub mod vm_table;
        pub use vm_table::VmTable;
    }

    pub use components::*;
}

pub mod logging;
pub use logging::Logger;

pub mod util {
    pub mod humanize;
}

pub use error::AppError;

pub use model::{app_state::AppState, ui_state::UIState};
