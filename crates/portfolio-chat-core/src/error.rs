//! Error types for the chat widget.

use reqwest::StatusCode;
use std::time::Duration;

/// Failures talking to the chat endpoint.
///
/// None of these ever reach the user as an error: the conversation turns
/// every variant into the fallback reply bubble.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Connection refused, DNS failure, reset, etc.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status.
    #[error("chat endpoint returned {0}")]
    Status(StatusCode),

    /// No response within the configured timeout.
    #[error("chat endpoint timed out after {0:?}")]
    Timeout(Duration),

    /// The body was not a JSON object with a string `reply` field.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The task running the request panicked or was cancelled.
    #[error("chat request task failed: {0}")]
    Task(String),
}

impl ChatError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ChatError::Transport(_) | ChatError::Timeout(_) => true,
            ChatError::Status(status) => status.is_server_error(),
            ChatError::MalformedResponse(_) | ChatError::Task(_) => false,
        }
    }
}

/// Why a submit was rejected. Rejection never changes the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("message is empty")]
    EmptyInput,

    #[error("a reply is already pending")]
    Pending,
}
