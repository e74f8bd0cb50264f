//! ActionDispatcher: applies actions to `AppState` and runs their side effects.
//!
//! State changes happen synchronously in [`ActionDispatcher::apply_action`]
//! while the state lock is held. Anything that needs the network comes back
//! as [`Followups`] and is spawned after the lock is released; results re-enter
//! through the task channel as `Action::TaskResult`.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::client::CollectorApi;
use crate::controller::actions::Action;
use crate::controller::event_loop::TaskResult;
use crate::model::agent::AgentMode;
use crate::model::app_state::AppState;
use crate::model::export::ExportFormat;
use crate::model::filter_chips::{delete_chip, delete_chip_group, status_chips};
use crate::model::lifecycle::{CollectorStatus, Effect, Effects, LifecycleEvent, Outcome};
use crate::model::query_state::SortColumn;
use crate::model::ui_state::{NotificationLevel, RedrawFlag, UIMode, UIOverlay};
use crate::model::vm::VmStatus;
use crate::tasks::collector_task::{
    spawn_agent_request, spawn_connect, spawn_disconnect, spawn_inventory_fetch,
    spawn_status_poller, spawn_status_sync,
};

/// Work left over after an action was applied to the state.
#[derive(Debug, Default)]
pub struct Followups {
    pub effects: Effects,
    pub fetch_agent_status: bool,
    pub set_agent_mode: Option<AgentMode>,
    pub quit: bool,
}

pub struct ActionDispatcher {
    app: Arc<Mutex<AppState>>,
    api: Arc<dyn CollectorApi>,
    task_tx: UnboundedSender<TaskResult>,
    poller: Option<CancellationToken>,
    poll_interval: Duration,
}

impl ActionDispatcher {
    pub fn new(
        app: Arc<Mutex<AppState>>,
        api: Arc<dyn CollectorApi>,
        task_tx: UnboundedSender<TaskResult>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            app,
            api,
            task_tx,
            poller: None,
            poll_interval,
        }
    }

    /// Start-up sync with the agent's collector and console link.
    pub async fn attach(&mut self) {
        let followups = {
            let mut app = self.app.lock().await;
            let (_, effects) = app.lifecycle.apply(LifecycleEvent::Attach);
            Followups {
                effects,
                fetch_agent_status: true,
                ..Followups::default()
            }
        };
        self.run_followups(followups);
    }

    /// Apply one action. Returns `false` if the application should terminate.
    pub async fn handle(&mut self, action: Action) -> bool {
        let followups = {
            let mut app = self.app.lock().await;
            Self::apply_action(&mut app, action)
        };

        let quit = followups.quit;
        self.run_followups(followups);
        !quit
    }

    /// Cancel the poller; in-flight one-shot requests are left to finish.
    pub fn shutdown(&mut self) {
        if let Some(token) = self.poller.take() {
            token.cancel();
        }
    }

    fn run_followups(&mut self, followups: Followups) {
        for effect in followups.effects {
            self.run_effect(effect);
        }
        if let Some(mode) = followups.set_agent_mode {
            spawn_agent_request(Arc::clone(&self.api), self.task_tx.clone(), Some(mode));
        } else if followups.fetch_agent_status {
            spawn_agent_request(Arc::clone(&self.api), self.task_tx.clone(), None);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        debug!(marker = "DISPATCH", operation_type = "effect", ?effect, "Running lifecycle effect");
        let api = Arc::clone(&self.api);
        let task_tx = self.task_tx.clone();

        match effect {
            Effect::Connect {
                generation,
                credentials,
            } => {
                spawn_connect(api, task_tx, generation, credentials);
            }
            Effect::Disconnect { generation } => {
                spawn_disconnect(api, task_tx, generation);
            }
            Effect::StartPolling { generation } => {
                self.shutdown();
                let token = CancellationToken::new();
                spawn_status_poller(api, task_tx, generation, self.poll_interval, token.clone());
                self.poller = Some(token);
            }
            Effect::StopPolling => self.shutdown(),
            Effect::SyncStatus { generation } => {
                spawn_status_sync(api, task_tx, generation);
            }
            Effect::FetchInventory { generation } => {
                spawn_inventory_fetch(api, task_tx, generation);
            }
        }
    }

    /// Apply an action to the state. Pure apart from logging.
    pub fn apply_action(app: &mut AppState, action: Action) -> Followups {
        let mut followups = Followups::default();

        // Errors stay up until the next keypress.
        let from_user = !matches!(
            action,
            Action::Tick | Action::NoOp | Action::Resize(..) | Action::TaskResult(_)
        );
        if from_user
            && app
                .ui
                .notification
                .as_ref()
                .is_some_and(|n| n.level == NotificationLevel::Error)
        {
            app.ui.dismiss_notification();
        }

        match action {
            Action::Quit => {
                info!(marker = "DISPATCH", "Quit requested");
                followups.quit = true;
                return followups;
            }

            Action::Tick => {
                app.ui.update_notification();
                return followups;
            }

            Action::NoOp => return followups,

            Action::Resize(..) => {}

            // Login form
            Action::LoginInput(ch) => app.login.insert_char(ch),
            Action::LoginBackspace => {
                app.login.delete_char();
            }
            Action::LoginNextField => app.login.focus_next(),
            Action::LoginPrevField => app.login.focus_prev(),
            Action::SubmitLogin => Self::submit_login(app, &mut followups),

            // Lifecycle commands
            Action::StopCollection => {
                let (outcome, effects) = app.lifecycle.apply(LifecycleEvent::Stop);
                match outcome {
                    Outcome::Applied => app.ui.show_info("Collection stopped"),
                    Outcome::Rejected(reason) => app.ui.show_warning(reason),
                    Outcome::Ignored | Outcome::Stale => {}
                }
                followups.effects = effects;
            }
            Action::RefreshStatus => {
                let (_, effects) = app.lifecycle.apply(LifecycleEvent::Attach);
                followups.effects = effects;
                followups.fetch_agent_status = true;
            }
            Action::RefreshInventory => {
                if app.lifecycle.status() == CollectorStatus::Collected {
                    followups.effects.push(Effect::FetchInventory {
                        generation: app.lifecycle.generation(),
                    });
                } else {
                    app.ui
                        .show_warning("Inventory is available once collection completes");
                }
            }

            // Search
            Action::EnterSearchMode => app.ui.mode = UIMode::Search,
            Action::ExitSearchMode => app.ui.mode = UIMode::Browse,
            Action::SearchInput(ch) => {
                app.query.push_search_char(ch);
                app.ui.cursor = 0;
            }
            Action::SearchBackspace => {
                app.query.pop_search_char();
                app.ui.cursor = 0;
            }
            Action::ClearSearch => {
                app.query.set_search("");
                app.ui.cursor = 0;
            }

            // Status filter
            Action::ToggleStatusFilter(status) => {
                app.query.toggle_status(status);
                app.ui.cursor = 0;
            }
            Action::RemoveFilterChip(label) => {
                if delete_chip(&mut app.query, &label) {
                    app.ui.cursor = 0;
                }
            }
            Action::RemoveLastFilterChip => {
                if let Some(chip) = status_chips(&app.query).pop() {
                    delete_chip(&mut app.query, &chip.label);
                    app.ui.cursor = 0;
                }
            }
            Action::ClearAllFilters => {
                delete_chip_group(&mut app.query);
                app.ui.cursor = 0;
            }

            Action::SortBy(column) => app.query.toggle_sort(column),

            // Pagination
            Action::NextPage => {
                let page = app.query.page() + 1;
                app.go_to_page(page);
            }
            Action::PrevPage => {
                let page = app.query.page().saturating_sub(1);
                app.go_to_page(page);
            }
            Action::FirstPage => app.go_to_page(1),
            Action::LastPage => {
                let last = app.page_count();
                app.go_to_page(last);
            }
            Action::CyclePageSize => {
                let next = app.config.table.next_page_size(app.query.page_size());
                if let Some(size) = NonZeroUsize::new(next) {
                    app.query.set_page_size(size);
                    app.ui.cursor = 0;
                    app.ui.show_info(format!("{next} rows per page"));
                }
            }

            // Cursor and selection
            Action::MoveCursorUp => app.ui.cursor_up(),
            Action::MoveCursorDown => {
                let page_len = app.page_rows().len();
                app.ui.cursor_down(page_len);
            }
            Action::ToggleRowSelection => {
                app.toggle_cursor_row();
            }
            Action::ToggleSelectAllVisible => app.toggle_select_all_visible(),
            Action::ClearSelection => app.selection.clear(),

            // Overlays
            Action::ToggleHelp => {
                if app.ui.overlay == UIOverlay::Help {
                    app.ui.close_overlay();
                } else {
                    app.ui.open_overlay(UIOverlay::Help);
                }
            }
            Action::OpenOverlay(overlay) => app.ui.open_overlay(overlay),
            Action::CloseOverlay => app.ui.close_overlay(),
            Action::MenuUp => app.ui.menu_up(),
            Action::MenuDown => app.ui.menu_down(),
            Action::MenuSelect => Self::menu_select(app),

            // Report actions
            Action::Export(format) => Self::export(app, format),
            Action::SendToDeepInspection => {
                if app.deep_inspection_enabled() {
                    let count = app.selection.len();
                    info!(
                        marker = "DISPATCH",
                        operation_type = "deep_inspection",
                        vms = count,
                        "Deep inspection requested"
                    );
                    app.ui
                        .show_info(format!("{count} VM(s) sent to deep inspection"));
                } else {
                    app.ui.show_warning("Select at least one VM first");
                }
            }
            Action::ToggleAgentMode => {
                app.agent.begin_request();
                followups.set_agent_mode = Some(app.agent.mode.toggled());
            }

            Action::TaskResult(result) => Self::apply_task_result(app, result, &mut followups),
        }

        app.refresh_view();
        app.ui.request_redraw(RedrawFlag::All);
        followups
    }

    fn submit_login(app: &mut AppState, followups: &mut Followups) {
        let credentials = match app.login.submit() {
            Ok(credentials) => credentials,
            Err(e) => {
                app.ui.show_error(e.to_string());
                return;
            }
        };

        let (outcome, effects) = app.lifecycle.apply(LifecycleEvent::Start(credentials));
        match outcome {
            Outcome::Applied => {
                app.login.clear_password();
                app.ui.show_info("Connecting to vCenter");
            }
            Outcome::Rejected(reason) => app.ui.show_warning(reason),
            Outcome::Ignored | Outcome::Stale => {}
        }
        followups.effects = effects;
    }

    fn menu_select(app: &mut AppState) {
        let index = app.ui.menu_cursor;
        match app.ui.overlay {
            UIOverlay::FilterMenu => {
                if let Some(status) = VmStatus::ALL.get(index) {
                    app.query.toggle_status(*status);
                    app.ui.cursor = 0;
                }
            }
            UIOverlay::SortMenu => {
                if let Some(column) = SortColumn::ALL.get(index) {
                    app.query.toggle_sort(*column);
                }
                app.ui.close_overlay();
            }
            UIOverlay::ExportMenu => {
                if let Some(item) = app.export_menu().get(index) {
                    Self::export(app, item.format);
                }
                app.ui.close_overlay();
            }
            UIOverlay::Help | UIOverlay::None => {}
        }
    }

    fn export(app: &mut AppState, format: ExportFormat) {
        let enabled = app
            .export_menu()
            .iter()
            .any(|item| item.format == format && item.enabled);
        if enabled {
            info!(
                marker = "DISPATCH",
                operation_type = "export",
                format = ?format,
                vms = app.inventory.len(),
                "Export requested"
            );
            app.ui.show_info(format!("{} requested", format.label()));
        } else {
            app.ui.show_warning("Nothing to export yet");
        }
    }

    /// Feed a lifecycle event and surface newly entered errors.
    fn lifecycle_event(app: &mut AppState, event: LifecycleEvent, followups: &mut Followups) -> Outcome {
        let before = app.lifecycle.status();
        let (outcome, effects) = app.lifecycle.apply(event);
        followups.effects.extend(effects);

        let state = app.lifecycle.state();
        if outcome == Outcome::Applied
            && state.status == CollectorStatus::Error
            && before != CollectorStatus::Error
        {
            let message = state
                .error
                .clone()
                .unwrap_or_else(|| "Collection failed".to_string());
            app.ui.show_error(message);
        }
        outcome
    }

    fn apply_task_result(app: &mut AppState, result: TaskResult, followups: &mut Followups) {
        match result {
            TaskResult::CollectorStarted { generation, result } => {
                let event = match result {
                    Ok(report) => LifecycleEvent::StartResolved { generation, report },
                    Err(e) => LifecycleEvent::StartFailed {
                        generation,
                        message: e.user_message(),
                    },
                };
                Self::lifecycle_event(app, event, followups);
            }

            TaskResult::CollectorStopped { generation, result } => match result {
                Ok(_) => {
                    Self::lifecycle_event(app, LifecycleEvent::StopResolved { generation }, followups);
                }
                Err(e) => {
                    let message = e.user_message();
                    let outcome = Self::lifecycle_event(
                        app,
                        LifecycleEvent::StopFailed {
                            generation,
                            message: message.clone(),
                        },
                        followups,
                    );
                    if outcome == Outcome::Applied {
                        app.ui.show_warning(format!("Stop request failed: {message}"));
                    }
                }
            },

            TaskResult::StatusPolled { generation, result } => {
                let event = match result {
                    Ok(report) => LifecycleEvent::PollResolved { generation, report },
                    Err(e) => LifecycleEvent::StatusFetchFailed {
                        generation,
                        message: e.user_message(),
                    },
                };
                Self::lifecycle_event(app, event, followups);
            }

            TaskResult::StatusSynced { generation, result } => {
                let event = match result {
                    Ok(report) => LifecycleEvent::StatusSynced { generation, report },
                    Err(e) => LifecycleEvent::StatusFetchFailed {
                        generation,
                        message: e.user_message(),
                    },
                };
                Self::lifecycle_event(app, event, followups);
            }

            TaskResult::InventoryLoaded { generation, result } => {
                if generation != app.lifecycle.generation() {
                    debug!(
                        marker = "DISPATCH",
                        operation_type = "inventory_fetch",
                        %generation,
                        current = %app.lifecycle.generation(),
                        "Discarding stale inventory result"
                    );
                    return;
                }

                match result {
                    Ok(records) => match app.inventory.replace(records) {
                        Ok(()) => {
                            let count = app.inventory.len();
                            app.ui.show_success(format!("Loaded {count} VMs"));
                        }
                        Err(e) => app.ui.show_warning(e.to_string()),
                    },
                    Err(e) => {
                        let message = e.user_message();
                        app.inventory.record_failure(message.clone());
                        app.ui
                            .show_warning(format!("Failed to fetch inventory: {message}"));
                    }
                }
            }

            TaskResult::AgentStatus { result } => match result {
                Ok(status) => app.agent.apply_status(status),
                Err(e) => {
                    warn!(
                        marker = "DISPATCH",
                        operation_type = "agent_status",
                        error = %e,
                        "Agent request failed"
                    );
                    app.agent.record_failure(e.user_message());
                }
            },
        }
    }
}
