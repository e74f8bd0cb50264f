//! src/view/components/menu_overlay.rs
//! ============================================================================
//! # Dropdown menus: status filter, sort column and export
//!
//! All three share one list renderer; entries are computed from `AppState`
//! so the checked marks always reflect the live query.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState},
};
use tracing::trace;

use crate::model::{
    app_state::AppState,
    filter_chips::status_menu,
    query_state::{SortColumn, SortDirection},
    ui_state::UIOverlay,
};
use crate::view::{components::login_panel::centered_rect, theme};

/// One rendered menu line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub checked: bool,
    pub enabled: bool,
}

pub struct MenuOverlay;

impl MenuOverlay {
    pub fn render(frame: &mut Frame<'_>, app: &AppState, area: Rect) {
        let entries = menu_entries(app, app.ui.overlay);
        if entries.is_empty() {
            return;
        }
        trace!(overlay = ?app.ui.overlay, entries = entries.len(), "Rendering menu overlay");

        let height = u16::try_from(entries.len()).unwrap_or(u16::MAX).saturating_add(4);
        let rect = centered_rect(area, 40, height);
        frame.render_widget(Clear, rect);

        let items: Vec<ListItem> = entries
            .iter()
            .map(|entry| {
                let mark = if entry.checked { "[x] " } else { "[ ] " };
                let style = if entry.enabled {
                    Style::default().fg(theme::FOREGROUND)
                } else {
                    theme::disabled_style()
                };
                ListItem::new(Line::from(vec![
                    Span::styled(mark, Style::default().fg(theme::CYAN)),
                    Span::styled(entry.label.clone(), style),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", app.ui.get_overlay_title()))
                    .title_bottom(Line::from(" Enter select • Esc close ").style(theme::hint_style()))
                    .title_style(theme::title_style())
                    .border_style(theme::focused_border_style())
                    .style(theme::panel_style()),
            )
            .highlight_style(
                Style::default()
                    .bg(theme::CURRENT_LINE)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        let mut state = ListState::default().with_selected(Some(app.ui.menu_cursor));
        frame.render_stateful_widget(list, rect, &mut state);
    }
}

pub fn menu_entries(app: &AppState, overlay: UIOverlay) -> Vec<MenuEntry> {
    match overlay {
        UIOverlay::FilterMenu => status_menu(&app.query)
            .into_iter()
            .map(|item| MenuEntry {
                label: item.label.to_string(),
                checked: item.selected,
                enabled: true,
            })
            .collect(),

        UIOverlay::SortMenu => SortColumn::ALL
            .into_iter()
            .map(|column| {
                let active = app.query.sort_column() == Some(column);
                let label = match (active, app.query.sort_direction()) {
                    (true, SortDirection::Asc) => format!("{} ▲", column.label()),
                    (true, SortDirection::Desc) => format!("{} ▼", column.label()),
                    (false, _) => column.label().to_string(),
                };
                MenuEntry {
                    label,
                    checked: active,
                    enabled: true,
                }
            })
            .collect(),

        UIOverlay::ExportMenu => app
            .export_menu()
            .into_iter()
            .map(|item| MenuEntry {
                label: item.format.label().to_string(),
                checked: false,
                enabled: item.enabled,
            })
            .collect(),

        UIOverlay::Help | UIOverlay::None => Vec::new(),
    }
}
