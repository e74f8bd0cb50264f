//! Key reference overlay, grouped by screen
use crate::view::{components::login_panel::centered_rect, theme};
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Login",
        &[
            ("Tab / Shift+Tab", "Next / previous field"),
            ("Enter", "Start collection"),
            ("Esc", "Stop a running collection"),
            ("F5", "Re-sync collector status"),
        ],
    ),
    (
        "Table",
        &[
            ("↑↓ / j k", "Move cursor"),
            ("←→ / PgUp PgDn", "Previous / next page"),
            ("Home / End", "First / last page"),
            ("z", "Cycle page size"),
            ("1-6", "Sort by column, again to reverse"),
        ],
    ),
    (
        "Search & filter",
        &[
            ("/", "Search by name (Esc to leave)"),
            ("c", "Clear search"),
            ("f", "Status filter menu"),
            ("x / X", "Remove last chip / clear status filter"),
            ("s", "Sort menu"),
        ],
    ),
    (
        "Selection & actions",
        &[
            ("Space", "Select row"),
            ("a", "Select or clear the visible page"),
            ("u", "Clear selection"),
            ("d", "Send selection to deep inspection"),
            ("e / P / C", "Export menu / PDF / CSV"),
            ("m", "Toggle console connection"),
            ("r", "Reload inventory"),
            ("S", "Stop collection"),
        ],
    ),
    (
        "Application",
        &[("? / F1", "Toggle this help"), ("q / Ctrl+C", "Quit")],
    ),
];

pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame<'_>, area: Rect) {
        let rect = centered_rect(area, 64, 36);
        frame.render_widget(Clear, rect);

        let mut lines = Vec::new();
        for (title, keys) in SECTIONS {
            lines.push(Line::from(Span::styled(
                *title,
                Style::default().fg(theme::CYAN).add_modifier(Modifier::BOLD),
            )));
            for (key, description) in *keys {
                lines.push(Line::from(vec![
                    Span::styled(format!("  {key:<18}"), Style::default().fg(theme::YELLOW)),
                    Span::raw(*description),
                ]));
            }
            lines.push(Line::from(""));
        }

        let help = Paragraph::new(Text::from(lines))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Help ")
                    .title_alignment(Alignment::Center)
                    .title_style(theme::title_style())
                    .border_style(theme::focused_border_style())
                    .style(theme::panel_style()),
            )
            .style(Style::default().fg(theme::FOREGROUND))
            .wrap(Wrap { trim: false });

        frame.render_widget(help, rect);
    }
}
