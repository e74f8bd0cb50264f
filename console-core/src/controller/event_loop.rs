//! ``src/controller/event_loop.rs``
//! ============================================================================
//! # Event Loop: Terminal Input, Task Results and Ticks
//!
//! Multiplexes the crossterm event stream, background task results and a
//! UI tick into a single stream of [`Action`]s. Key mapping depends on the
//! current screen, input mode and overlay, captured as a [`KeyContext`].

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event as TermEvent, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::AppError;
use crate::controller::actions::Action;
use crate::model::agent::AgentStatus;
use crate::model::app_state::{AppState, Screen};
use crate::model::export::ExportFormat;
use crate::model::lifecycle::{Generation, StatusReport};
use crate::model::query_state::SortColumn;
use crate::model::ui_state::{UIMode, UIOverlay};
use crate::model::vm::VmRecord;

const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Result of a background agent request.
#[derive(Debug, Clone)]
pub enum TaskResult {
    CollectorStarted {
        generation: Generation,
        result: Result<StatusReport, Arc<AppError>>,
    },

    CollectorStopped {
        generation: Generation,
        result: Result<Option<StatusReport>, Arc<AppError>>,
    },

    StatusPolled {
        generation: Generation,
        result: Result<StatusReport, Arc<AppError>>,
    },

    StatusSynced {
        generation: Generation,
        result: Result<StatusReport, Arc<AppError>>,
    },

    InventoryLoaded {
        generation: Generation,
        result: Result<Vec<VmRecord>, Arc<AppError>>,
    },

    AgentStatus {
        result: Result<AgentStatus, Arc<AppError>>,
    },
}

/// What the key mapper needs to know about the current UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyContext {
    pub screen: Screen,
    pub mode: UIMode,
    pub overlay: UIOverlay,
}

impl KeyContext {
    pub fn from_state(app: &AppState) -> Self {
        Self {
            screen: app.screen(),
            mode: app.ui.mode,
            overlay: app.ui.overlay,
        }
    }
}

pub struct EventLoop {
    app: Arc<Mutex<AppState>>,
    task_rx: mpsc::UnboundedReceiver<TaskResult>,
    event_stream: EventStream,
    tick: Interval,
}

impl EventLoop {
    pub fn new(app: Arc<Mutex<AppState>>, task_rx: mpsc::UnboundedReceiver<TaskResult>) -> Self {
        info!(marker = "EVENT_LOOP", "Initializing event loop");
        let mut tick = tokio::time::interval(TICK_INTERVAL);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Self {
            app,
            task_rx,
            event_stream: EventStream::new(),
            tick,
        }
    }

    /// Wait for the next action; `None` once every source is closed.
    pub async fn next_action(&mut self) -> Option<Action> {
        tokio::select! {
            Some(Ok(event)) = self.event_stream.next() => {
                trace!("Terminal event received: {:?}", event);
                let context = KeyContext::from_state(&*self.app.lock().await);
                let action = map_event(context, event);
                debug!(marker = "EVENT_LOOP", ?action, "Terminal event mapped");
                Some(action)
            }

            Some(task_result) = self.task_rx.recv() => {
                trace!("Task result received: {:?}", task_result);
                Some(Action::TaskResult(task_result))
            }

            _ = self.tick.tick() => Some(Action::Tick),
        }
    }
}

pub fn map_event(context: KeyContext, event: TermEvent) -> Action {
    match event {
        TermEvent::Key(key) if key.kind != KeyEventKind::Release => map_key(context, key),
        TermEvent::Resize(w, h) => Action::Resize(w, h),
        _ => Action::NoOp,
    }
}

pub fn map_key(context: KeyContext, key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }

    if context.overlay == UIOverlay::Help {
        return match key.code {
            KeyCode::Esc | KeyCode::Char('?' | 'q') | KeyCode::F(1) => Action::CloseOverlay,
            _ => Action::NoOp,
        };
    }

    match context.screen {
        Screen::Login => map_login_key(key),
        Screen::Report => match (context.overlay, context.mode) {
            (UIOverlay::None, UIMode::Search) => map_search_key(key),
            (UIOverlay::None, UIMode::Browse) => map_report_key(key),
            _ => map_menu_key(key),
        },
    }
}

fn map_login_key(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Tab | KeyCode::Down => Action::LoginNextField,
        KeyCode::BackTab | KeyCode::Up => Action::LoginPrevField,
        KeyCode::Enter => Action::SubmitLogin,
        KeyCode::Backspace => Action::LoginBackspace,
        KeyCode::Esc => Action::StopCollection,
        KeyCode::F(1) => Action::ToggleHelp,
        KeyCode::F(5) => Action::RefreshStatus,
        KeyCode::Char('q') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
        KeyCode::Char(ch) => Action::LoginInput(ch),
        _ => Action::NoOp,
    }
}

fn map_search_key(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Esc | KeyCode::Enter => Action::ExitSearchMode,
        KeyCode::Backspace => Action::SearchBackspace,
        KeyCode::Char(ch) => Action::SearchInput(ch),
        _ => Action::NoOp,
    }
}

fn map_menu_key(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Action::CloseOverlay,
        KeyCode::Up | KeyCode::Char('k') => Action::MenuUp,
        KeyCode::Down | KeyCode::Char('j') => Action::MenuDown,
        KeyCode::Enter | KeyCode::Char(' ') => Action::MenuSelect,
        _ => Action::NoOp,
    }
}

fn map_report_key(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('?') | KeyCode::F(1) => Action::ToggleHelp,
        KeyCode::Char('/') => Action::EnterSearchMode,
        KeyCode::Char('c') => Action::ClearSearch,
        KeyCode::Char('f') => Action::OpenOverlay(UIOverlay::FilterMenu),
        KeyCode::Char('s') => Action::OpenOverlay(UIOverlay::SortMenu),
        KeyCode::Char('e') => Action::OpenOverlay(UIOverlay::ExportMenu),
        KeyCode::Char('x') => Action::RemoveLastFilterChip,
        KeyCode::Char('X') => Action::ClearAllFilters,
        KeyCode::Char(digit @ '1'..='6') => {
            let index = digit as usize - '1' as usize;
            Action::SortBy(SortColumn::ALL[index])
        }
        KeyCode::Up | KeyCode::Char('k') => Action::MoveCursorUp,
        KeyCode::Down | KeyCode::Char('j') => Action::MoveCursorDown,
        KeyCode::Char(' ') => Action::ToggleRowSelection,
        KeyCode::Char('a') => Action::ToggleSelectAllVisible,
        KeyCode::Char('u') => Action::ClearSelection,
        KeyCode::Right | KeyCode::Char('l' | 'n') | KeyCode::PageDown => Action::NextPage,
        KeyCode::Left | KeyCode::Char('h' | 'p') | KeyCode::PageUp => Action::PrevPage,
        KeyCode::Home | KeyCode::Char('g') => Action::FirstPage,
        KeyCode::End | KeyCode::Char('G') => Action::LastPage,
        KeyCode::Char('z') => Action::CyclePageSize,
        KeyCode::Char('d') => Action::SendToDeepInspection,
        KeyCode::Char('m') => Action::ToggleAgentMode,
        KeyCode::Char('r') | KeyCode::F(5) => Action::RefreshInventory,
        KeyCode::Char('P') => Action::Export(ExportFormat::Pdf),
        KeyCode::Char('C') => Action::Export(ExportFormat::Csv),
        KeyCode::Char('S') => Action::StopCollection,
        _ => Action::NoOp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn report(mode: UIMode, overlay: UIOverlay) -> KeyContext {
        KeyContext {
            screen: Screen::Report,
            mode,
            overlay,
        }
    }

    const LOGIN: KeyContext = KeyContext {
        screen: Screen::Login,
        mode: UIMode::Browse,
        overlay: UIOverlay::None,
    };

    #[test]
    fn login_keys_edit_the_form() {
        assert!(matches!(map_key(LOGIN, key(KeyCode::Char('q'))), Action::LoginInput('q')));
        assert!(matches!(map_key(LOGIN, key(KeyCode::Tab)), Action::LoginNextField));
        assert!(matches!(map_key(LOGIN, key(KeyCode::Enter)), Action::SubmitLogin));
        assert!(matches!(
            map_key(LOGIN, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        ));
    }

    #[test]
    fn search_mode_captures_characters() {
        let ctx = report(UIMode::Search, UIOverlay::None);
        assert!(matches!(map_key(ctx, key(KeyCode::Char('q'))), Action::SearchInput('q')));
        assert!(matches!(map_key(ctx, key(KeyCode::Esc)), Action::ExitSearchMode));
    }

    #[test]
    fn browse_keys_drive_the_table() {
        let ctx = report(UIMode::Browse, UIOverlay::None);
        assert!(matches!(map_key(ctx, key(KeyCode::Char('q'))), Action::Quit));
        assert!(matches!(
            map_key(ctx, key(KeyCode::Char('5'))),
            Action::SortBy(SortColumn::DiskSize)
        ));
        assert!(matches!(
            map_key(ctx, key(KeyCode::Char('f'))),
            Action::OpenOverlay(UIOverlay::FilterMenu)
        ));
        assert!(matches!(map_key(ctx, key(KeyCode::Char('9'))), Action::NoOp));
    }

    #[test]
    fn menus_and_help_capture_keys() {
        let ctx = report(UIMode::Browse, UIOverlay::FilterMenu);
        assert!(matches!(map_key(ctx, key(KeyCode::Enter)), Action::MenuSelect));
        assert!(matches!(map_key(ctx, key(KeyCode::Char('q'))), Action::CloseOverlay));

        let ctx = report(UIMode::Browse, UIOverlay::Help);
        assert!(matches!(map_key(ctx, key(KeyCode::Char('x'))), Action::NoOp));
        assert!(matches!(map_key(ctx, key(KeyCode::Esc)), Action::CloseOverlay));
    }

    #[test]
    fn key_releases_are_ignored() {
        let mut release = key(KeyCode::Char('q'));
        release.kind = KeyEventKind::Release;
        let ctx = report(UIMode::Browse, UIOverlay::None);
        assert!(matches!(map_event(ctx, TermEvent::Key(release)), Action::NoOp));
    }
}
