//! UI state: input mode, overlays, table cursor and notifications

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

use compact_str::CompactString;

/// Atomic redraw flags so renderers can check and clear through `&self`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RedrawFlag {
    Main = 1,
    StatusBar = 2,
    Overlay = 4,
    Notification = 8,
    All = 15,
}

impl RedrawFlag {
    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// Where typed characters go on the report screen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum UIMode {
    #[default]
    Browse = 0,
    Search = 1,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum UIOverlay {
    #[default]
    None = 0,
    Help = 1,
    FilterMenu = 2,
    ExportMenu = 3,
    SortMenu = 4,
}

impl UIOverlay {
    /// Entries in the overlay's menu, for cursor clamping.
    pub const fn menu_len(self) -> usize {
        match self {
            Self::FilterMenu => 3,
            Self::ExportMenu => 2,
            Self::SortMenu => 6,
            Self::None | Self::Help => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NotificationLevel {
    Info = 0,
    Success = 1,
    Warning = 2,
    Error = 3,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: CompactString,
    pub level: NotificationLevel,
    pub timestamp: Instant,
    pub auto_dismiss_ms: Option<u32>,
}

#[derive(Debug)]
pub struct UIState {
    pub redraw_flags: AtomicU32,
    pub frame_count: AtomicU64,

    pub mode: UIMode,
    pub overlay: UIOverlay,

    /// Row cursor within the current page.
    pub cursor: usize,
    /// Cursor within the open overlay menu.
    pub menu_cursor: usize,

    pub notification: Option<Notification>,
    pub last_update: Instant,
}

impl Default for UIState {
    fn default() -> Self {
        Self::new()
    }
}

impl UIState {
    pub fn new() -> Self {
        Self {
            redraw_flags: AtomicU32::new(u32::from(RedrawFlag::All.bits())),
            frame_count: AtomicU64::new(0),
            mode: UIMode::Browse,
            overlay: UIOverlay::None,
            cursor: 0,
            menu_cursor: 0,
            notification: None,
            last_update: Instant::now(),
        }
    }

    #[inline]
    pub fn request_redraw(&self, flag: RedrawFlag) {
        self.redraw_flags
            .fetch_or(u32::from(flag.bits()), Ordering::Relaxed);
    }

    #[inline]
    pub fn needs_redraw(&self) -> bool {
        self.redraw_flags.load(Ordering::Relaxed) != 0
    }

    #[inline]
    pub fn clear_redraw(&self) {
        self.redraw_flags.store(0, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_frame(&self) {
        self.frame_count.fetch_add(1, Ordering::Relaxed);
    }

    // Notification system with inline helpers
    pub fn show_notification(
        &mut self,
        message: impl Into<CompactString>,
        level: NotificationLevel,
        auto_dismiss_ms: Option<u32>,
    ) {
        self.notification = Some(Notification {
            message: message.into(),
            level,
            timestamp: Instant::now(),
            auto_dismiss_ms,
        });
        self.request_redraw(RedrawFlag::Notification);
    }

    #[inline]
    pub fn show_info(&mut self, message: impl Into<CompactString>) {
        self.show_notification(message, NotificationLevel::Info, Some(3000));
    }

    #[inline]
    pub fn show_success(&mut self, message: impl Into<CompactString>) {
        self.show_notification(message, NotificationLevel::Success, Some(2000));
    }

    #[inline]
    pub fn show_warning(&mut self, message: impl Into<CompactString>) {
        self.show_notification(message, NotificationLevel::Warning, Some(5000));
    }

    #[inline]
    pub fn show_error(&mut self, message: impl Into<CompactString>) {
        self.show_notification(message, NotificationLevel::Error, None);
    }

    pub fn dismiss_notification(&mut self) {
        if self.notification.take().is_some() {
            self.request_redraw(RedrawFlag::Notification);
        }
    }

    // Auto-dismiss notifications
    pub fn update_notification(&mut self) -> bool {
        if let Some(notification) = &self.notification
            && let Some(auto_dismiss_ms) = notification.auto_dismiss_ms
            && notification.timestamp.elapsed().as_millis() > u128::from(auto_dismiss_ms)
        {
            self.notification = None;
            self.request_redraw(RedrawFlag::Notification);
            return true;
        }
        false
    }

    pub fn open_overlay(&mut self, overlay: UIOverlay) {
        self.overlay = overlay;
        self.menu_cursor = 0;
        self.mode = UIMode::Browse;
        self.request_redraw(RedrawFlag::Overlay);
    }

    pub fn close_overlay(&mut self) {
        self.overlay = UIOverlay::None;
        self.request_redraw(RedrawFlag::All);
    }

    pub fn get_overlay_title(&self) -> &'static str {
        match self.overlay {
            UIOverlay::Help => "Help",
            UIOverlay::FilterMenu => "Filter by status",
            UIOverlay::ExportMenu => "Export",
            UIOverlay::SortMenu => "Sort by",
            UIOverlay::None => "",
        }
    }

    pub fn menu_up(&mut self) {
        if self.menu_cursor > 0 {
            self.menu_cursor -= 1;
            self.request_redraw(RedrawFlag::Overlay);
        }
    }

    pub fn menu_down(&mut self) {
        if self.menu_cursor + 1 < self.overlay.menu_len() {
            self.menu_cursor += 1;
            self.request_redraw(RedrawFlag::Overlay);
        }
    }

    pub fn cursor_up(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.request_redraw(RedrawFlag::Main);
        }
    }

    pub fn cursor_down(&mut self, page_len: usize) {
        if self.cursor + 1 < page_len {
            self.cursor += 1;
            self.request_redraw(RedrawFlag::Main);
        }
    }

    /// Keep the cursor on a row after the page shrank.
    pub fn clamp_cursor(&mut self, page_len: usize) {
        self.cursor = self.cursor.min(page_len.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_operations() {
        let ui_state = UIState::new();

        ui_state.request_redraw(RedrawFlag::Main);
        assert!(ui_state.needs_redraw());

        ui_state.clear_redraw();
        assert!(!ui_state.needs_redraw());

        ui_state.increment_frame();
        assert_eq!(ui_state.frame_count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_menu_cursor_is_bounded_by_overlay() {
        let mut ui_state = UIState::new();
        ui_state.open_overlay(UIOverlay::ExportMenu);
        ui_state.menu_down();
        ui_state.menu_down();
        assert_eq!(ui_state.menu_cursor, 1);

        ui_state.open_overlay(UIOverlay::FilterMenu);
        assert_eq!(ui_state.menu_cursor, 0);
        assert_eq!(ui_state.get_overlay_title(), "Filter by status");
    }

    #[test]
    fn test_cursor_clamps_to_page() {
        let mut ui_state = UIState::new();
        ui_state.cursor_down(3);
        ui_state.cursor_down(3);
        ui_state.cursor_down(3);
        assert_eq!(ui_state.cursor, 2);

        ui_state.clamp_cursor(1);
        assert_eq!(ui_state.cursor, 0);
        ui_state.clamp_cursor(0);
        assert_eq!(ui_state.cursor, 0);
    }

    #[test]
    fn test_errors_do_not_auto_dismiss() {
        let mut ui_state = UIState::new();
        ui_state.show_error("agent unreachable");
        assert!(!ui_state.update_notification());
        assert!(ui_state.notification.is_some());

        ui_state.dismiss_notification();
        assert!(ui_state.notification.is_none());
    }
}
