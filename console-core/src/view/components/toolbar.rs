//! ``src/view/components/toolbar.rs``
//! ============================================================================
//! # Toolbar: search box, status chips and pagination
//!
//! Mirrors the table's query state. The search box shows a caret while the
//! UI is in search mode; chips list the active status filter in the order it
//! was built up.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::engine::paginate::window;
use crate::model::{app_state::AppState, filter_chips::{STATUS_CATEGORY, status_chips}, ui_state::UIMode};
use crate::view::theme;

pub struct Toolbar;

impl Toolbar {
    pub fn render(frame: &mut Frame<'_>, app: &AppState, area: Rect) {
        let [search_area, chips_area] =
            Layout::horizontal([Constraint::Percentage(40), Constraint::Fill(1)]).areas(area);

        Self::render_search(frame, app, search_area);
        Self::render_chips(frame, app, chips_area);
    }

    fn render_search(frame: &mut Frame<'_>, app: &AppState, area: Rect) {
        let searching = app.ui.mode == UIMode::Search;
        let search = app.query.search();

        let text = if search.is_empty() && !searching {
            Line::from(Span::styled("Search by name  (/)", theme::hint_style()))
        } else {
            let mut spans = vec![Span::raw(search.to_string())];
            if searching {
                spans.push(Span::styled("▏", Style::default().fg(theme::PURPLE)));
            }
            Line::from(spans)
        };

        let border = if searching {
            theme::focused_border_style()
        } else {
            theme::border_style()
        };
        frame.render_widget(
            Paragraph::new(text).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Search ")
                    .border_style(border),
            ),
            area,
        );
    }

    fn render_chips(frame: &mut Frame<'_>, app: &AppState, area: Rect) {
        let chips = status_chips(&app.query);
        let line = if chips.is_empty() {
            Line::from(Span::styled("No status filter  (f)", theme::hint_style()))
        } else {
            let mut spans = Vec::with_capacity(chips.len() * 2);
            for chip in &chips {
                spans.push(Span::styled(
                    format!(" {} ✕ ", chip.label),
                    theme::chip_style().fg(theme::status_color(chip.status)),
                ));
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled("x remove • X clear all", theme::hint_style()));
            Line::from(spans)
        };

        frame.render_widget(
            Paragraph::new(line).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {STATUS_CATEGORY} "))
                    .border_style(theme::border_style()),
            ),
            area,
        );
    }
}

/// "1 - 20 of 57 · page 1/3 · 20 per page"
pub fn pagination_label(app: &AppState) -> String {
    let total = app.filtered_len();
    let range = window(total, app.query.page(), app.query.page_size());
    let first = if range.is_empty() { 0 } else { range.start + 1 };

    format!(
        "{first} - {} of {total} · page {}/{} · {} per page",
        range.end,
        app.query.page(),
        app.page_count(),
        app.query.page_size()
    )
}

pub fn pagination_line(app: &AppState) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            pagination_label(app),
            Style::default()
                .fg(theme::FOREGROUND)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ←/→ page • z page size", theme::hint_style()),
    ])
}
