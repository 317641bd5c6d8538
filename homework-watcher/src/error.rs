//! Error types for the watcher
//!
//! - `ConfigError`: fatal, raised before the loop starts
//! - `WatchError`: everything that can end a single tick early
//! - `NotifyError`: delivery failures, always swallowed by the loop

use thiserror::Error;

/// Startup configuration failure. The process cannot run without credentials.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .names.join(", "))]
    MissingCredentials { names: Vec<&'static str> },
}

/// Failure of one poll tick.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("endpoint {endpoint} answered {status} for from_date={from_date}: {body}")]
    EndpointStatus {
        endpoint: String,
        status: u16,
        from_date: i64,
        body: String,
    },

    #[error("homework API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected type for {context}: expected {expected}, got {actual}")]
    UnexpectedType {
        context: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("API response is missing key `{0}`")]
    MissingKey(&'static str),

    #[error("homework list is empty, the bot may have just been started")]
    EmptyHomeworks,

    #[error("unexpected homework status {0:?}")]
    InvalidStatus(Option<String>),

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

/// Severity class of a `WatchError`, drives how the loop logs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Nothing new since the cursor. Normal right after startup.
    Idle,
    /// Endpoint status, response shape or status code problems.
    Expected,
    /// Network-level failure talking to the endpoint.
    Transport,
    /// Anything else.
    Unexpected,
}

impl WatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyHomeworks => ErrorKind::Idle,
            Self::EndpointStatus { .. }
            | Self::UnexpectedType { .. }
            | Self::MissingKey(_)
            | Self::InvalidStatus(_) => ErrorKind::Expected,
            Self::Request(_) => ErrorKind::Transport,
            Self::Unexpected(_) => ErrorKind::Unexpected,
        }
    }
}

/// Message delivery failure.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("telegram request failed: {0}")]
    Transport(reqwest::Error),

    #[error("telegram rejected the message: {description}")]
    Api { description: String },
}

// The sendMessage URL embeds the bot token
impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.without_url())
    }
}

/// Short JSON type name for diagnostics.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
