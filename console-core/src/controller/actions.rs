//! src/controller/actions.rs
//! ============================================================================
//! # Actions: Centralized Application Commands
//!
//! Defines the `Action` enum, which represents all user inputs and internal
//! events the console responds to. Key events are mapped to actions by the
//! event loop; the dispatcher is the only place actions mutate state.

use crate::{
    controller::event_loop::TaskResult,
    model::{
        export::ExportFormat, query_state::SortColumn, ui_state::UIOverlay, vm::VmStatus,
    },
};

/// Represents a high-level action that the application can perform.
#[derive(Debug, Clone)]
pub enum Action {
    // Login form
    LoginInput(char),

    LoginBackspace,

    LoginNextField,

    LoginPrevField,

    /// Validate credentials and start a collection.
    SubmitLogin,

    // Collection lifecycle
    StopCollection,

    /// Re-sync collector status with the agent.
    RefreshStatus,

    /// Re-fetch the inventory of a collected session.
    RefreshInventory,

    // Search
    EnterSearchMode,

    ExitSearchMode,

    SearchInput(char),

    SearchBackspace,

    ClearSearch,

    // Status filter and chips
    ToggleStatusFilter(VmStatus),

    /// Remove one chip by its label.
    RemoveFilterChip(String),

    /// Remove the most recently added chip.
    RemoveLastFilterChip,

    ClearAllFilters,

    // Sorting
    SortBy(SortColumn),

    // Pagination
    NextPage,

    PrevPage,

    FirstPage,

    LastPage,

    CyclePageSize,

    // Table cursor and selection
    MoveCursorUp,

    MoveCursorDown,

    ToggleRowSelection,

    /// Header checkbox: select the page, or clear it when fully selected.
    ToggleSelectAllVisible,

    ClearSelection,

    // Overlays and menus
    ToggleHelp,

    OpenOverlay(UIOverlay),

    CloseOverlay,

    MenuUp,

    MenuDown,

    MenuSelect,

    // Report actions
    Export(ExportFormat),

    SendToDeepInspection,

    ToggleAgentMode,

    /// Result from a background task.
    TaskResult(TaskResult),

    Resize(u16, u16),

    Tick,

    NoOp,

    Quit,
}
