//! Response validation and status interpretation
//!
//! The API answers with something like:
//!
//! ```json
//! { "homeworks": [ { "homework_name": "proj1", "status": "approved" } ],
//!   "current_date": 1700000000 }
//! ```
//!
//! Only the first homework is interpreted; it is the most recent one.

use crate::error::{json_type_name, WatchError};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Known review statuses. Anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HomeworkStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl HomeworkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Reviewing => "reviewing",
            Self::Rejected => "rejected",
        }
    }

    /// Human-readable verdict sent to the chat
    pub fn verdict(&self) -> &'static str {
        match self {
            Self::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            Self::Reviewing => "Работа взята на проверку ревьюером.",
            Self::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

impl FromStr for HomeworkStatus {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(Self::Approved),
            "reviewing" => Ok(Self::Reviewing),
            "rejected" => Ok(Self::Rejected),
            other => Err(WatchError::InvalidStatus(Some(other.to_string()))),
        }
    }
}

impl fmt::Display for HomeworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// (name, status) of the latest homework. Compared structurally between ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeworkUpdate {
    pub name: String,
    pub status: HomeworkStatus,
}

impl HomeworkUpdate {
    pub fn message(&self) -> String {
        format!(
            "Изменился статус проверки работы \"{}\". {}",
            self.name,
            self.status.verdict()
        )
    }
}

/// Enforce the payload shape and return the first homework record.
pub fn check_response(payload: &Value) -> Result<&Map<String, Value>, WatchError> {
    let root = payload.as_object().ok_or(WatchError::UnexpectedType {
        context: "API response",
        expected: "object",
        actual: json_type_name(payload),
    })?;

    let homeworks = root.get("homeworks").ok_or(WatchError::MissingKey("homeworks"))?;

    let list = homeworks.as_array().ok_or(WatchError::UnexpectedType {
        context: "homeworks",
        expected: "array",
        actual: json_type_name(homeworks),
    })?;

    let first = list.first().ok_or(WatchError::EmptyHomeworks)?;

    first.as_object().ok_or(WatchError::UnexpectedType {
        context: "homework entry",
        expected: "object",
        actual: json_type_name(first),
    })
}

/// Extract name and status from one homework record.
pub fn parse_status(homework: &Map<String, Value>) -> Result<HomeworkUpdate, WatchError> {
    let name = homework
        .get("homework_name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or(WatchError::MissingKey("homework_name"))?;

    let status = match homework.get("status") {
        Some(Value::String(code)) => code.parse::<HomeworkStatus>()?,
        Some(other) => return Err(WatchError::InvalidStatus(Some(other.to_string()))),
        None => return Err(WatchError::InvalidStatus(None)),
    };

    Ok(HomeworkUpdate {
        name: name.to_string(),
        status,
    })
}

/// Server-supplied cursor for the next poll, if any.
pub fn current_date(payload: &Value) -> Option<i64> {
    let value = payload.get("current_date")?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|secs| secs as i64))
}
