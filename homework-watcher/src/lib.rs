//! Homework Watcher - polls the homework review API and reports status
//! changes to a Telegram chat
//!
//! - `config`: credentials from the environment, fixed endpoints
//! - `api`: homework status endpoint client
//! - `response`: payload validation and status interpretation
//! - `notifier`: Telegram delivery
//! - `watcher`: the poll-compare-notify loop
//! - `logging`: rotating log file sink

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod notifier;
pub mod response;
pub mod watcher;

pub use api::{HomeworkSource, PracticumClient};
pub use config::{Config, Credentials};
pub use error::{ConfigError, ErrorKind, NotifyError, WatchError};
pub use notifier::{Notifier, TelegramNotifier};
pub use response::{HomeworkStatus, HomeworkUpdate};
pub use watcher::{TickOutcome, Watcher};
