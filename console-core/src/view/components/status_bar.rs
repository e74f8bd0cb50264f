//! src/view/components/status_bar.rs
//!
//! One-line footer: input mode, collector phase and selection on the left;
//! console connection and inventory freshness on the right.

use crate::{
    model::{app_state::AppState, ui_state::UIMode},
    view::theme,
};
use ratatui::{
    prelude::*,
    widgets::{Paragraph, Widget},
};

pub struct StatusBar;

impl StatusBar {
    pub fn render(frame: &mut Frame<'_>, app: &AppState, area: Rect) {
        let mode_str = match app.ui.mode {
            UIMode::Browse => "Browse",
            UIMode::Search => "Search",
        };
        let status = app.lifecycle.status();

        let left = Line::from(vec![
            Span::styled(
                format!(" {mode_str} "),
                Style::default().fg(theme::BACKGROUND).bg(theme::PURPLE),
            ),
            Span::raw(" Collector: "),
            Span::styled(status.label(), Style::default().fg(theme::collector_color(status))),
            Span::raw(format!(" | Selected: {}", app.selection.len())),
        ]);

        let mut right = format!("Console: {}", app.agent.connection_label());
        if app.agent.loading {
            right.push_str(" (updating)");
        } else if app.agent.error.is_some() {
            right.push_str(" (unreachable)");
        }
        if let Some(loaded_at) = app.inventory.loaded_at() {
            right.push_str(&format!(" | Inventory {} ", loaded_at.format("%H:%M:%S")));
        }

        let [left_area, right_area] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(area);

        Paragraph::new(left)
            .style(Style::default().fg(theme::FOREGROUND).bg(theme::BACKGROUND))
            .alignment(Alignment::Left)
            .render(left_area, frame.buffer_mut());

        Paragraph::new(right)
            .style(Style::default().fg(theme::FOREGROUND).bg(theme::BACKGROUND))
            .alignment(Alignment::Right)
            .render(right_area, frame.buffer_mut());
    }
}
