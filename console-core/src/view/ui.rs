//! src/view/ui.rs
//! ============================================================
//! Frame renderer that draws the whole console from `AppState`.
//! Called with the state lock held; nothing here mutates state
//! apart from the redraw bookkeeping on `UIState`.

use std::time::{Duration, Instant};

use ratatui::{
    prelude::*,
    widgets::{Block, Paragraph},
};
use tracing::{instrument, trace, warn};

use crate::{
    model::{
        app_state::{AppState, Screen},
        inventory::InventorySummary,
        ui_state::{NotificationLevel, UIOverlay},
    },
    view::{
        components::{
            help_overlay::HelpOverlay,
            login_panel::LoginPanel,
            menu_overlay::MenuOverlay,
            notification_overlay::NotificationOverlay,
            status_bar::StatusBar,
            toolbar::{Toolbar, pagination_line},
            vm_table::VmTable,
        },
        theme,
    },
};

/// ---------------------------------------------------------------------------
/// Renderer struct (contains only caches + stats)
/// ---------------------------------------------------------------------------
pub struct UIRenderer {
    cache: LayoutCache,
    stats: RenderStats,
}

#[derive(Default)]
struct LayoutCache {
    screen: Rect,
    /// summary, toolbar, table, pagination, status bar
    report: [Rect; 5],
    /// body, status bar
    login: [Rect; 2],
    hit: u64,
    miss: u64,
}

#[derive(Default)]
pub struct RenderStats {
    pub frames: u64,
    pub slow: u64,
    pub total: Duration,
}

impl Default for UIRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// ---------------------------------------------------------------------------
/// public API
/// ---------------------------------------------------------------------------
impl UIRenderer {
    pub fn new() -> Self {
        Self {
            cache: LayoutCache::default(),
            stats: RenderStats::default(),
        }
    }

    #[instrument(level = "trace", skip(self, f, app))]
    pub fn render(&mut self, f: &mut Frame<'_>, app: &AppState) {
        let start = Instant::now();
        self.update_layout_cache(f.area());

        f.render_widget(Block::default().style(theme::panel_style()), f.area());

        match app.screen() {
            Screen::Login => self.draw_login(f, app),
            Screen::Report => self.draw_report(f, app),
        }
        self.draw_overlays(f, app);

        app.ui.clear_redraw();
        app.ui.increment_frame();

        let dur = start.elapsed();
        self.stats.total += dur;
        self.stats.frames += 1;
        if dur.as_millis() > 16 {
            self.stats.slow += 1;
            warn!(
                marker = "UI_RENDER_SLOW",
                render_time_us = dur.as_micros(),
                "Slow frame"
            );
        }
    }

    pub const fn stats(&self) -> &RenderStats {
        &self.stats
    }
}

/// ---------------------------------------------------------------------------
/// screens
/// ---------------------------------------------------------------------------
impl UIRenderer {
    fn draw_login(&self, f: &mut Frame<'_>, app: &AppState) {
        let [body, status] = self.cache.login;
        LoginPanel::render(f, app, body);
        StatusBar::render(f, app, status);
    }

    fn draw_report(&self, f: &mut Frame<'_>, app: &AppState) {
        let [summary, toolbar, table, pagination, status] = self.cache.report;

        f.render_widget(Paragraph::new(summary_line(&app.summary())), summary);
        Toolbar::render(f, app, toolbar);
        VmTable::render(f, app, table);
        f.render_widget(
            Paragraph::new(pagination_line(app)).alignment(Alignment::Right),
            pagination,
        );
        StatusBar::render(f, app, status);
    }

    fn draw_overlays(&self, f: &mut Frame<'_>, app: &AppState) {
        let scr = f.area();
        match app.ui.overlay {
            UIOverlay::None => {}
            UIOverlay::Help => HelpOverlay::render(f, scr),
            UIOverlay::FilterMenu | UIOverlay::SortMenu | UIOverlay::ExportMenu => {
                MenuOverlay::render(f, app, scr);
            }
        }

        if let Some(n) = &app.ui.notification {
            let r = notification_rect(scr, n.level);
            NotificationOverlay::render(f, n, r);
        }
    }
}

/// ---------------------------------------------------------------------------
/// util: layout / rectangles
/// ---------------------------------------------------------------------------
impl UIRenderer {
    fn update_layout_cache(&mut self, scr: Rect) {
        if self.cache.screen == scr && self.cache.miss > 0 {
            self.cache.hit += 1;
            return;
        }
        trace!(width = scr.width, height = scr.height, "Recomputing layout");

        self.cache.screen = scr;
        self.cache.miss += 1;
        self.cache.report = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(scr);
        self.cache.login = Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(scr);
    }
}

fn notification_rect(scr: Rect, lvl: NotificationLevel) -> Rect {
    let h = if lvl == NotificationLevel::Error { 5 } else { 3 };
    let w = (scr.width * 60) / 100;
    Rect {
        x: scr.x + (scr.width - w) / 2,
        y: scr.y + 1,
        width: w,
        height: h.min(scr.height),
    }
}

fn summary_line(summary: &InventorySummary) -> Line<'static> {
    let plural = |n: usize| if n == 1 { "" } else { "s" };
    Line::from(vec![
        Span::styled(
            format!(" {} VM{}", summary.total_vms, plural(summary.total_vms)),
            theme::title_style(),
        ),
        Span::raw(format!(
            " across {} cluster{}   ",
            summary.total_clusters,
            plural(summary.total_clusters)
        )),
        Span::styled(
            format!("● {} migratable  ", summary.migratable),
            Style::default().fg(theme::GREEN),
        ),
        Span::styled(
            format!("● {} with warnings  ", summary.with_warnings),
            Style::default().fg(theme::YELLOW),
        ),
        Span::styled(
            format!("● {} not migratable", summary.not_migratable),
            Style::default().fg(theme::RED),
        ),
    ])
}

/// ---------------------------------------------------------------------------
/// stats helpers
/// ---------------------------------------------------------------------------
impl RenderStats {
    pub fn fps(&self) -> f64 {
        if self.frames > 0 && !self.total.is_zero() {
            self.frames as f64 / self.total.as_secs_f64()
        } else {
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// tests
// ---------------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{
        lifecycle::{CollectorStatus, LifecycleEvent, StatusReport},
        vm::fixtures::sample_inventory,
    };
    use ratatui::{Terminal, backend::TestBackend};
    use std::sync::Arc;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn draw(app: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        let mut renderer = UIRenderer::new();
        terminal.draw(|f| renderer.render(f, app)).unwrap();
        screen_text(&terminal)
    }

    fn report_state() -> AppState {
        let mut app = AppState::new(Arc::new(Config::default()));
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
    fn login_screen_masks_password() {
        let mut app = AppState::new(Arc::new(Config::default()));
        app.login.focus_next();
        app.login.focus_next();
        for ch in "hunter2".chars() {
            app.login.insert_char(ch);
        }

        let text = draw(&app);
        assert!(text.contains("Connect to vCenter"));
        assert!(text.contains("•••••••"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn report_screen_lists_page_rows() {
        let mut app = report_state();
        app.toggle_cursor_row();

        let text = draw(&app);
        assert!(text.contains("5 VMs across 1 cluster"));
        assert!(text.contains("web-server-01"));
        assert!(text.contains("[x]"));
        assert!(text.contains("[-]"));
        assert!(text.contains("1 - 5 of 5"));
    }

    #[test]
    fn menu_overlay_is_drawn_over_table() {
        let mut app = report_state();
        app.ui.open_overlay(UIOverlay::SortMenu);
        let text = draw(&app);
        assert!(text.contains("Sort by"));
        assert!(text.contains("Memory size"));
    }

    #[test]
    fn layout_cache_hits_on_same_size() {
        let mut r = UIRenderer::new();
        r.update_layout_cache(Rect::new(0, 0, 100, 40));
        r.update_layout_cache(Rect::new(0, 0, 100, 40));
        assert_eq!(r.cache.hit, 1);
        assert_eq!(r.cache.miss, 1);
    }
}
