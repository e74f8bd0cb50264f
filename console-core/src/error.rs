//! src/error.rs
//! ============================================================================
//! # `AppError`: Unified Error Type for the Migration Console
//!
//! Every fallible operation in the crate returns `Result<T, AppError>`. The
//! variants follow the console's error taxonomy: credential validation
//! failures, network/agent failures and inventory payload problems. Stale
//! async responses are not errors; they are discarded by the lifecycle.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::model::vm::VmId;

/// Unified error type for all console operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Standard IO error, auto-converted from `io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TOML config parsing error.
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// TOML config serialization error.
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Config file I/O error with path.
    #[error("Failed to access config file {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Config values that parse but make no sense together.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization or deserialization error (e.g., JSON).
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Credentials rejected before any request was made.
    #[error("Invalid {field}: {message}")]
    InvalidCredentials {
        field: &'static str,
        message: String,
    },

    /// Transport failure talking to the discovery agent.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success response from the discovery agent.
    #[error("Agent returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded.
    #[error("Unexpected response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    /// Two inventory records share an id.
    #[error("Inventory contains duplicate VM id {0}")]
    DuplicateVmId(VmId),

    /// Inventory record with values outside their domain.
    #[error("Inventory record {id} is invalid: {reason}")]
    InvalidRecord { id: VmId, reason: String },

    /// Terminal I/O or rendering error.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Operation cancelled by user or system.
    #[error("Operation was cancelled")]
    Cancelled,

    /// Any other error, with description.
    #[error("Unexpected error: {0}")]
    Other(String),
}

impl AppError {
    #[must_use]
    /// Attach extra context to an error.
    pub fn with_context<S: Into<String>>(self, ctx: S) -> Self {
        Self::Other(format!("{}: {}", ctx.into(), self))
    }

    /// Create a credential validation error
    pub fn invalid_credentials<S: Into<String>>(field: &'static str, message: S) -> Self {
        Self::InvalidCredentials {
            field,
            message: message.into(),
        }
    }

    /// Create an API error from a status code and server message
    pub fn api<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a decode error for the given endpoint
    pub fn decode<S1: Into<String>, S2: Into<String>>(endpoint: S1, reason: S2) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid record error
    pub fn invalid_record<S: Into<String>>(id: VmId, reason: S) -> Self {
        Self::InvalidRecord {
            id,
            reason: reason.into(),
        }
    }

    /// True for failures produced by the agent round-trip rather than local input.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Api { .. } | Self::Decode { .. }
        )
    }

    /// Message suitable for the single user-visible error line.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            let endpoint = e.url().map_or_else(String::new, ToString::to_string);
            Self::decode(endpoint, e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

// Allow conversion from `anyhow::Error` as fallback.
impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        Self::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_surface_server_message() {
        let err = AppError::api(500, "vCenter unreachable");
        assert_eq!(err.user_message(), "vCenter unreachable");
        assert!(err.is_network());
    }

    #[test]
    fn validation_errors_are_not_network() {
        let err = AppError::invalid_credentials("url", "must not be empty");
        assert!(!err.is_network());
        assert_eq!(err.to_string(), "Invalid url: must not be empty");
    }
}
