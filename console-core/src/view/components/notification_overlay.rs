//! src/view/components/notification_overlay.rs
use crate::model::ui_state::{Notification, NotificationLevel};
use crate::view::theme;
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Style, Stylize},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tracing::{debug, instrument};

pub struct NotificationOverlay;

impl NotificationOverlay {
    #[instrument(
        level = "trace",
        skip_all,
        fields(
            marker = "NOTIFICATION_DISPLAYED",
            level = ?notification.level,
            message_len = notification.message.len()
        )
    )]
    pub fn render(frame: &mut Frame<'_>, notification: &Notification, area: Rect) {
        frame.render_widget(Clear, area);

        let color = theme::notification_color(notification.level);
        let (title, icon) = match notification.level {
            NotificationLevel::Info => ("Info", "ℹ"),
            NotificationLevel::Warning => ("Warning", "⚠"),
            NotificationLevel::Error => ("Error", "✕"),
            NotificationLevel::Success => ("Success", "✓"),
        };

        let dismiss = if notification.auto_dismiss_ms.is_some() {
            ""
        } else {
            " any key dismisses "
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {icon} {title} "))
            .title_bottom(dismiss)
            .title_style(Style::default().fg(color).bold())
            .border_style(Style::default().fg(color))
            .style(Style::default().bg(theme::BACKGROUND));

        let message = Paragraph::new(notification.message.as_str())
            .style(Style::default().fg(theme::FOREGROUND))
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Left)
            .block(block);
        frame.render_widget(message, area);

        if notification.level == NotificationLevel::Error {
            debug!(
                marker = "NOTIFICATION_ERROR",
                message = %notification.message,
                "Error notification displayed to user"
            );
        }
    }
}
