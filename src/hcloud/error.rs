//! Error types for the Hetzner Cloud client.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by the Hetzner Cloud client.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum HcloudError {
    /// Raised when the client configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when the API answers with a non-success status.
    #[error("{operation} failed with status {status}: {message}")]
    Api {
        /// Operation that was rejected.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body returned by the API.
        message: String,
    },
    /// Raised when the request never produced a usable response.
    #[error("{operation} transport error: {message}")]
    Transport {
        /// Operation that was attempted.
        operation: &'static str,
        /// Message returned by the HTTP layer.
        message: String,
    },
    /// Raised when a response does not match the expected shape.
    #[error("failed to decode {context} response: {message}")]
    Decode {
        /// Operation whose response failed to decode.
        context: &'static str,
        /// Decoder message.
        message: String,
    },
    /// Raised when an action finishes with status `error`.
    #[error("action {id} ({command}) failed: {message} ({code})")]
    ActionFailed {
        /// Action identifier.
        id: i64,
        /// Command the action performed.
        command: String,
        /// Error code reported for the action.
        code: String,
        /// Error message reported for the action.
        message: String,
    },
    /// Raised when an action does not finish before the timeout.
    #[error("timeout waiting for action {id} ({command})")]
    Timeout {
        /// Action identifier.
        id: i64,
        /// Command the action performed.
        command: String,
    },
}

impl HcloudError {
    /// Returns true when the API reported a missing resource.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// Maps an `hcloud` SDK error raised by `operation`.
    pub(crate) fn from_api<T: fmt::Debug>(
        operation: &'static str,
        err: hcloud::apis::Error<T>,
    ) -> Self {
        match err {
            hcloud::apis::Error::ResponseError(response) => Self::Api {
                operation,
                status: response.status.as_u16(),
                message: response.content,
            },
            other => Self::Transport {
                operation,
                message: other.to_string(),
            },
        }
    }
}

impl From<ConfigError> for HcloudError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}
