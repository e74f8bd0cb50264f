//! src/view/components/login_panel.rs
//! ============================================================================
//! # LoginPanel: vCenter credentials and collection progress
//!
//! Shown until a collected inventory is available. The form is locked while a
//! collection is in flight; the step line tracks the collector phases.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::model::{
    app_state::AppState,
    lifecycle::CollectorStatus,
    login_form::LoginField,
};
use crate::view::theme;

const STEPS: [CollectorStatus; 4] = [
    CollectorStatus::Connecting,
    CollectorStatus::Connected,
    CollectorStatus::Collecting,
    CollectorStatus::Collected,
];

pub struct LoginPanel;

impl LoginPanel {
    pub fn render(frame: &mut Frame<'_>, app: &AppState, area: Rect) {
        let panel = centered_rect(area, 64, 20);
        frame.render_widget(Clear, panel);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Connect to vCenter ")
            .title_style(theme::title_style())
            .border_style(theme::focused_border_style())
            .style(theme::panel_style());
        let inner = block.inner(panel);
        frame.render_widget(block, panel);

        let [fields, steps, message, hints] = Layout::vertical([
            Constraint::Length(9),
            Constraint::Length(2),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        let locked = app.lifecycle.status().is_active();
        let field_areas = Layout::vertical([Constraint::Length(3); 3]).split(fields);
        for (field, field_area) in [LoginField::Url, LoginField::Username, LoginField::Password]
            .into_iter()
            .zip(field_areas.iter())
        {
            Self::render_field(frame, app, field, locked, *field_area);
        }

        frame.render_widget(Paragraph::new(Self::step_line(app.lifecycle.status())), steps);
        frame.render_widget(
            Paragraph::new(Self::message_lines(app)).wrap(Wrap { trim: true }),
            message,
        );

        let hint = if locked {
            "Esc stop collection • F1 help • Ctrl+C quit"
        } else {
            "Tab next field • Enter start collection • F5 refresh • Ctrl+C quit"
        };
        frame.render_widget(
            Paragraph::new(hint)
                .style(theme::hint_style())
                .alignment(Alignment::Center),
            hints,
        );
    }

    fn render_field(
        frame: &mut Frame<'_>,
        app: &AppState,
        field: LoginField,
        locked: bool,
        area: Rect,
    ) {
        let focused = !locked && app.login.focus == field;
        let mut value = app.login.display_value(field);
        if focused {
            value.push('▏');
        }

        let border = if focused {
            theme::focused_border_style()
        } else {
            theme::border_style()
        };
        let text_style = if locked {
            theme::disabled_style()
        } else {
            Style::default().fg(theme::FOREGROUND)
        };

        let input = Paragraph::new(value).style(text_style).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", field.label()))
                .border_style(border),
        );
        frame.render_widget(input, area);
    }

    fn step_line(status: CollectorStatus) -> Line<'static> {
        let reached = STEPS.iter().position(|step| *step == status);
        let mut spans = Vec::with_capacity(STEPS.len() * 2);

        for (i, step) in STEPS.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" → ", theme::hint_style()));
            }
            let style = match reached {
                Some(current) if i == current => Style::default()
                    .fg(theme::collector_color(*step))
                    .add_modifier(Modifier::BOLD),
                Some(current) if i < current => Style::default().fg(theme::GREEN),
                _ => Style::default().fg(theme::COMMENT),
            };
            spans.push(Span::styled(step.label(), style));
        }
        Line::from(spans)
    }

    fn message_lines(app: &AppState) -> Vec<Line<'static>> {
        let state = app.lifecycle.state();
        let mut lines = Vec::new();

        if let Some(validation) = &app.login.validation {
            lines.push(Line::from(Span::styled(
                validation.clone(),
                Style::default().fg(theme::YELLOW),
            )));
        }

        match state.status {
            CollectorStatus::Error => {
                let error = state
                    .error
                    .clone()
                    .unwrap_or_else(|| "Collection failed".to_string());
                lines.push(Line::from(Span::styled(error, Style::default().fg(theme::RED))));
                lines.push(Line::from(Span::styled(
                    "Check the credentials and press Enter to retry.",
                    theme::hint_style(),
                )));
            }
            CollectorStatus::Collected => {
                let text = match app.inventory.last_error() {
                    Some(error) => format!("Inventory unavailable: {error}"),
                    None => "Loading inventory…".to_string(),
                };
                lines.push(Line::from(text).fg(theme::CYAN));
            }
            status if status.is_active() => {
                lines.push(Line::from(format!("{status}…")).fg(theme::collector_color(status)));
            }
            _ => {}
        }

        if state.busy && !state.status.is_active() {
            lines.push(Line::from(Span::styled("Stopping…", theme::hint_style())));
        }
        lines
    }
}

/// Centre a `width` x `height` box inside `area`, shrinking to fit.
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
