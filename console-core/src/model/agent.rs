//! ``src/model/agent.rs``
//!
//! Discovery agent mode and console link, as reported by `GET /agent`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether the agent reports to the console or runs standalone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    Connected,
    #[default]
    Disconnected,
}

impl AgentMode {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Connected => Self::Disconnected,
            Self::Disconnected => Self::Connected,
        }
    }
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        })
    }
}

/// Actual state of the link to the console, which may lag the requested mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleConnection {
    Connected,
    #[default]
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub mode: AgentMode,
    pub console_connection: ConsoleConnection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentState {
    pub mode: AgentMode,
    pub console_connection: ConsoleConnection,
    pub loading: bool,
    pub error: Option<String>,
}

impl AgentState {
    pub fn begin_request(&mut self) {
        self.loading = true;
    }

    pub fn apply_status(&mut self, status: AgentStatus) {
        self.mode = status.mode;
        self.console_connection = status.console_connection;
        self.loading = false;
        self.error = None;
    }

    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    /// Header label for the discovery VM.
    #[must_use]
    pub const fn connection_label(&self) -> &'static str {
        match self.console_connection {
            ConsoleConnection::Connected => "Connected",
            ConsoleConnection::Disconnected => "Disconnected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_snake_case_payload() {
        let status: AgentStatus =
            serde_json::from_str(r#"{"mode":"connected","console_connection":"disconnected"}"#)
                .unwrap();
        assert_eq!(status.mode, AgentMode::Connected);
        assert_eq!(status.console_connection, ConsoleConnection::Disconnected);
    }

    #[test]
    fn failure_keeps_last_known_status() {
        let mut agent = AgentState::default();
        agent.apply_status(AgentStatus {
            mode: AgentMode::Connected,
            console_connection: ConsoleConnection::Connected,
        });
        agent.begin_request();
        agent.record_failure("Failed to change agent mode");

        assert!(!agent.loading);
        assert_eq!(agent.mode, AgentMode::Connected);
        assert_eq!(agent.connection_label(), "Connected");
        assert_eq!(agent.error.as_deref(), Some("Failed to change agent mode"));
    }
}
