//! Poll-compare-notify loop
//!
//! Each tick: fetch -> validate -> interpret -> compare with last seen ->
//! notify on change -> advance cursor. A failing tick is logged and the loop
//! sleeps as usual; nothing but process termination stops it.

use crate::api::HomeworkSource;
use crate::config::Config;
use crate::error::{ErrorKind, WatchError};
use crate::notifier::Notifier;
use crate::response::{check_response, current_date, parse_status, HomeworkUpdate};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Result of a tick that reached the comparison step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Status changed. `delivered` is false when the notifier failed.
    Notified { update: HomeworkUpdate, delivered: bool },
    /// Same (name, status) as the previous tick.
    Unchanged,
}

pub struct Watcher<S, N> {
    source: S,
    notifier: N,
    retry_period: Duration,
    cursor: i64,
    last_seen: Option<HomeworkUpdate>,
}

impl<S, N> Watcher<S, N>
where
    S: HomeworkSource,
    N: Notifier,
{
    /// `start_cursor` is normally the current unix time.
    pub fn new(source: S, notifier: N, config: &Config, start_cursor: i64) -> Self {
        Self {
            source,
            notifier,
            retry_period: config.retry_period,
            cursor: start_cursor,
            last_seen: None,
        }
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn last_seen(&self) -> Option<&HomeworkUpdate> {
        self.last_seen.as_ref()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// One pass without the trailing sleep. Errors are returned, not logged.
    pub async fn tick(&mut self) -> Result<TickOutcome, WatchError> {
        let payload = self.source.fetch(self.cursor).await?;
        let homework = check_response(&payload)?;
        let update = parse_status(homework)?;

        let outcome = if self.last_seen.as_ref() == Some(&update) {
            debug!("No status change for \"{}\" ({})", update.name, update.status);
            TickOutcome::Unchanged
        } else {
            info!("Status of \"{}\" is now {}", update.name, update.status);
            // Stored before delivery: a failed send is not retried next tick.
            self.last_seen = Some(update.clone());
            let delivered = self.send_message(&update.message()).await;
            TickOutcome::Notified { update, delivered }
        };

        if let Some(next) = current_date(&payload) {
            self.cursor = next;
        }

        Ok(outcome)
    }

    /// Send and swallow delivery errors.
    async fn send_message(&self, text: &str) -> bool {
        match self.notifier.send_message(text).await {
            Ok(()) => {
                debug!("Message delivered");
                true
            }
            Err(e) => {
                error!("Failed to send message: {}", e);
                false
            }
        }
    }

    /// Run one tick and log its failure. Panics inside the tick are contained.
    pub async fn run_once(&mut self) -> Option<TickOutcome> {
        let result = match AssertUnwindSafe(self.tick()).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(WatchError::Unexpected(panic_message(&*panic))),
        };

        match result {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                log_tick_error(&e);
                None
            }
        }
    }

    /// Tick forever, sleeping `retry_period` after every tick.
    pub async fn run(mut self) {
        info!(
            "Watching homework statuses from {} every {}s",
            self.cursor,
            self.retry_period.as_secs()
        );

        loop {
            self.run_once().await;
            tokio::time::sleep(self.retry_period).await;
        }
    }
}

fn log_tick_error(e: &WatchError) {
    match e.kind() {
        ErrorKind::Idle => warn!("{}", e),
        ErrorKind::Expected => error!("{}", e),
        ErrorKind::Transport => error!("Request processing failed: {}", e),
        ErrorKind::Unexpected => error!(severity = "critical", "Program failure: {}", e),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::error::NotifyError;
    use crate::response::HomeworkStatus;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct ScriptedSource {
        replies: Mutex<VecDeque<Result<Value, WatchError>>>,
        cursors: Mutex<Vec<i64>>,
    }

    impl ScriptedSource {
        fn with(replies: Vec<Result<Value, WatchError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                cursors: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HomeworkSource for ScriptedSource {
        async fn fetch(&self, from_date: i64) -> Result<Value, WatchError> {
            self.cursors.lock().unwrap().push(from_date);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(json!({ "homeworks": [] })))
        }
    }

    struct PanickingSource;

    #[async_trait]
    impl HomeworkSource for PanickingSource {
        async fn fetch(&self, _from_date: i64) -> Result<Value, WatchError> {
            panic!("source exploded")
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<String>>>,
        failing: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_message(&self, text: &str) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(text.to_string());
            if self.failing {
                return Err(NotifyError::Api {
                    description: "Bad Request: chat not found".into(),
                });
            }
            Ok(())
        }
    }

    fn config() -> Config {
        let creds = Credentials::new(Some("p".into()), Some("t".into()), Some("1".into())).unwrap();
        Config::new(creds).with_retry_period(Duration::from_millis(1))
    }

    fn homework(name: &str, status: &str, current_date: i64) -> Value {
        json!({
            "homeworks": [{ "homework_name": name, "status": status }],
            "current_date": current_date
        })
    }

    fn watcher(
        replies: Vec<Result<Value, WatchError>>,
        notifier: RecordingNotifier,
    ) -> Watcher<ScriptedSource, RecordingNotifier> {
        Watcher::new(ScriptedSource::with(replies), notifier, &config(), 100)
    }

    #[tokio::test]
    async fn test_identical_ticks_notify_once() {
        let notifier = RecordingNotifier::default();
        let mut w = watcher(
            vec![
                Ok(homework("proj1", "reviewing", 200)),
                Ok(homework("proj1", "reviewing", 300)),
                Ok(homework("proj1", "reviewing", 400)),
            ],
            notifier.clone(),
        );

        assert!(matches!(w.tick().await.unwrap(), TickOutcome::Notified { delivered: true, .. }));
        assert_eq!(w.tick().await.unwrap(), TickOutcome::Unchanged);
        assert_eq!(w.tick().await.unwrap(), TickOutcome::Unchanged);

        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
        let seen = w.last_seen().unwrap();
        assert_eq!(seen.name, "proj1");
        assert_eq!(seen.status, HomeworkStatus::Reviewing);
    }

    #[tokio::test]
    async fn test_status_change_notifies_again() {
        let notifier = RecordingNotifier::default();
        let mut w = watcher(
            vec![
                Ok(homework("proj1", "reviewing", 200)),
                Ok(homework("proj1", "approved", 300)),
            ],
            notifier.clone(),
        );

        w.tick().await.unwrap();
        w.tick().await.unwrap();

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(
            sent[1],
            "Изменился статус проверки работы \"proj1\". Работа проверена: ревьюеру всё понравилось. Ура!"
        );
    }

    #[tokio::test]
    async fn test_cursor_advances_from_current_date() {
        let notifier = RecordingNotifier::default();
        let mut w = watcher(
            vec![
                Ok(homework("proj1", "reviewing", 250)),
                Ok(json!({ "homeworks": [{ "homework_name": "proj1", "status": "reviewing" }] })),
            ],
            notifier,
        );

        assert_eq!(w.cursor(), 100);
        w.tick().await.unwrap();
        assert_eq!(w.cursor(), 250);
        // no current_date: cursor kept
        w.tick().await.unwrap();
        assert_eq!(w.cursor(), 250);

        assert_eq!(*w.source().cursors.lock().unwrap(), vec![100, 250]);
    }

    #[tokio::test]
    async fn test_empty_homeworks_does_not_notify() {
        let notifier = RecordingNotifier::default();
        let mut w = watcher(
            vec![Ok(json!({ "homeworks": [], "current_date": 500 }))],
            notifier.clone(),
        );

        let err = w.tick().await.unwrap_err();
        assert!(matches!(err, WatchError::EmptyHomeworks));
        assert!(notifier.sent.lock().unwrap().is_empty());
        assert!(w.last_seen().is_none());
        assert_eq!(w.cursor(), 100);
    }

    #[tokio::test]
    async fn test_invalid_status_does_not_notify() {
        let notifier = RecordingNotifier::default();
        let mut w = watcher(vec![Ok(homework("proj1", "unknown", 200))], notifier.clone());

        let err = w.tick().await.unwrap_err();
        assert!(matches!(err, WatchError::InvalidStatus(Some(_))));
        assert!(notifier.sent.lock().unwrap().is_empty());
        assert!(w.last_seen().is_none());
    }

    #[tokio::test]
    async fn test_endpoint_status_stays_inside_loop() {
        let notifier = RecordingNotifier::default();
        let mut w = watcher(
            vec![
                Err(WatchError::EndpointStatus {
                    endpoint: "http://stub/".into(),
                    status: 404,
                    from_date: 100,
                    body: "{}".into(),
                }),
                Ok(homework("proj1", "approved", 200)),
            ],
            notifier.clone(),
        );

        assert_eq!(w.run_once().await, None);
        assert!(matches!(w.run_once().await, Some(TickOutcome::Notified { .. })));
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_delivery_is_swallowed_and_not_retried() {
        let notifier = RecordingNotifier {
            failing: true,
            ..Default::default()
        };
        let mut w = watcher(
            vec![
                Ok(homework("proj1", "rejected", 200)),
                Ok(homework("proj1", "rejected", 300)),
            ],
            notifier.clone(),
        );

        assert!(matches!(
            w.run_once().await,
            Some(TickOutcome::Notified { delivered: false, .. })
        ));
        assert_eq!(w.run_once().await, Some(TickOutcome::Unchanged));
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_panic_in_tick_is_contained() {
        let notifier = RecordingNotifier::default();
        let mut w = Watcher::new(PanickingSource, notifier.clone(), &config(), 100);

        assert_eq!(w.run_once().await, None);
        assert_eq!(w.run_once().await, None);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(&*boxed), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&*boxed), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(&*boxed), "panic with non-string payload");
    }
}
