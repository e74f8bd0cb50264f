//! src/view/components/vm_table.rs

use crate::{
    model::{
        app_state::AppState,
        query_state::{SortColumn, SortDirection},
        selection::SelectAllState,
        vm::VmRecord,
    },
    util::humanize::human_readable_gb,
    view::theme,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, HighlightSpacing, Paragraph, Row, Table, TableState},
};

const CHECKED: &str = "[x]";
const UNCHECKED: &str = "[ ]";
const INDETERMINATE: &str = "[-]";

pub struct VmTable;

impl VmTable {
    pub fn render(frame: &mut Frame<'_>, app: &AppState, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Virtual machines ({}) ", app.filtered_len()))
            .title_style(theme::title_style())
            .border_style(theme::border_style())
            .style(theme::panel_style());

        let rows = app.page_rows();
        if rows.is_empty() {
            let text = if app.inventory.is_empty() {
                "The collected inventory is empty"
            } else {
                "No VMs match the current search and filters"
            };
            frame.render_widget(
                Paragraph::new(text)
                    .style(theme::hint_style())
                    .alignment(Alignment::Center)
                    .block(block),
                area,
            );
            return;
        }

        let header = Self::header(app);
        let body: Vec<Row> = rows
            .iter()
            .map(|record| Self::row(app, record))
            .collect();

        let widths = [
            Constraint::Length(3),
            Constraint::Fill(2),
            Constraint::Length(16),
            Constraint::Length(12),
            Constraint::Fill(1),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Fill(2),
        ];

        let mut table_state = TableState::default().with_selected(Some(app.ui.cursor));

        let table = Table::new(body, widths)
            .header(header)
            .block(block)
            .row_highlight_style(theme::highlight_style())
            .highlight_symbol("▶ ")
            .highlight_spacing(HighlightSpacing::Always);

        frame.render_stateful_widget(table, area, &mut table_state);
    }

    fn header(app: &AppState) -> Row<'static> {
        let checkbox = match app.header_state() {
            SelectAllState::Checked => CHECKED,
            SelectAllState::Indeterminate => INDETERMINATE,
            SelectAllState::Unchecked => UNCHECKED,
        };

        let mut cells = vec![Cell::from(checkbox)];
        cells.extend(
            SortColumn::ALL
                .iter()
                .map(|column| Cell::from(column_title(app, *column))),
        );
        cells.push(Cell::from("Issues"));

        Row::new(cells).style(theme::header_style()).bottom_margin(1)
    }

    fn row<'a>(app: &AppState, record: &'a VmRecord) -> Row<'a> {
        let checkbox = if app.selection.contains(&record.id) {
            CHECKED
        } else {
            UNCHECKED
        };
        let status_style = Style::default().fg(theme::status_color(record.status));
        let issues_style = if record.has_errors() {
            Style::default().fg(theme::RED)
        } else if record.has_warnings() {
            Style::default().fg(theme::YELLOW)
        } else {
            Style::default().fg(theme::COMMENT)
        };

        Row::new(vec![
            Cell::from(checkbox),
            Cell::from(record.name.as_str()),
            Cell::from(record.status.label()).style(status_style),
            Cell::from(record.datacenter.as_str()),
            Cell::from(record.cluster.as_str()),
            Cell::from(human_readable_gb(record.disk_size_gb)),
            Cell::from(human_readable_gb(record.memory_size_gb)),
            Cell::from(record.issue_summary()).style(issues_style),
        ])
        .style(Style::default().fg(theme::FOREGROUND))
    }
}

fn column_title(app: &AppState, column: SortColumn) -> String {
    match (app.query.sort_column(), app.query.sort_direction()) {
        (Some(active), SortDirection::Asc) if active == column => format!("{} ▲", column.label()),
        (Some(active), SortDirection::Desc) if active == column => {
            format!("{} ▼", column.label())
        }
        _ => column.label().to_string(),
    }
}
