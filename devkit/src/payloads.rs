/*!
Builders for API payloads

Shapes follow the homework status endpoint and the Telegram Bot API envelope.
*/

use serde_json::{json, Value};

pub struct PayloadBuilder;

impl PayloadBuilder {
    /// One homework record
    pub fn homework<S: Into<String>>(name: S, status: S) -> Value {
        json!({
            "id": 1,
            "homework_name": name.into(),
            "status": status.into(),
            "reviewer_comment": "",
            "lesson_name": "final project",
            "date_updated": "2026-10-14T10:00:00Z"
        })
    }

    /// Full status response
    pub fn statuses(homeworks: Vec<Value>, current_date: i64) -> Value {
        json!({
            "homeworks": homeworks,
            "current_date": current_date
        })
    }

    /// Response with a single homework
    pub fn single<S: Into<String>>(name: S, status: S, current_date: i64) -> Value {
        Self::statuses(vec![Self::homework(name, status)], current_date)
    }

    /// Response with nothing new
    pub fn empty(current_date: i64) -> Value {
        Self::statuses(Vec::new(), current_date)
    }

    pub fn telegram_ok() -> Value {
        json!({
            "ok": true,
            "result": { "message_id": 1 }
        })
    }

    pub fn telegram_error<S: Into<String>>(error_code: u16, description: S) -> Value {
        json!({
            "ok": false,
            "error_code": error_code,
            "description": description.into()
        })
    }
}
