//! Configuration: credentials from the environment plus fixed constants
//!
//! Handles:
//! - Reading `PRACTICUM_TOKEN`, `TELEGRAM_TOKEN`, `TELEGRAM_CHAT_ID`
//! - Rejecting empty or absent values before anything else runs
//! - Endpoint URLs and the poll interval

use crate::error::ConfigError;
use std::fmt;
use std::time::Duration;

pub const PRACTICUM_TOKEN_VAR: &str = "PRACTICUM_TOKEN";
pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_TOKEN";
pub const TELEGRAM_CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

/// Homework status endpoint.
pub const ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

/// Telegram Bot API base URL.
pub const TELEGRAM_API: &str = "https://api.telegram.org";

/// Pause between two ticks.
pub const RETRY_PERIOD: Duration = Duration::from_secs(600);

/// Per-request timeout for both HTTP collaborators.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The three required secrets. Only constructible when all are non-empty.
#[derive(Clone)]
pub struct Credentials {
    practicum_token: String,
    telegram_token: String,
    telegram_chat_id: String,
}

impl Credentials {
    /// Validate raw values. `None` and `""` both count as missing.
    pub fn new(
        practicum_token: Option<String>,
        telegram_token: Option<String>,
        telegram_chat_id: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut take = |value: Option<String>, name: &'static str| match value {
            Some(v) if !v.is_empty() => v,
            _ => {
                missing.push(name);
                String::new()
            }
        };

        let practicum_token = take(practicum_token, PRACTICUM_TOKEN_VAR);
        let telegram_token = take(telegram_token, TELEGRAM_TOKEN_VAR);
        let telegram_chat_id = take(telegram_chat_id, TELEGRAM_CHAT_ID_VAR);

        if !missing.is_empty() {
            return Err(ConfigError::MissingCredentials { names: missing });
        }

        Ok(Self {
            practicum_token,
            telegram_token,
            telegram_chat_id,
        })
    }

    /// Read credentials from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(
            std::env::var(PRACTICUM_TOKEN_VAR).ok(),
            std::env::var(TELEGRAM_TOKEN_VAR).ok(),
            std::env::var(TELEGRAM_CHAT_ID_VAR).ok(),
        )
    }

    pub fn practicum_token(&self) -> &str {
        &self.practicum_token
    }

    pub fn telegram_token(&self) -> &str {
        &self.telegram_token
    }

    pub fn telegram_chat_id(&self) -> &str {
        &self.telegram_chat_id
    }
}

// Never print tokens
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("practicum_token", &"***")
            .field("telegram_token", &"***")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}

/// Runtime configuration handed to the API client, notifier and loop.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub endpoint: String,
    pub telegram_api: String,
    pub retry_period: Duration,
    pub request_timeout: Duration,
}

impl Config {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            endpoint: ENDPOINT.to_string(),
            telegram_api: TELEGRAM_API.to_string(),
            retry_period: RETRY_PERIOD,
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_telegram_api(mut self, base_url: impl Into<String>) -> Self {
        self.telegram_api = base_url.into();
        self
    }

    pub fn with_retry_period(mut self, period: Duration) -> Self {
        self.retry_period = period;
        self
    }
}
