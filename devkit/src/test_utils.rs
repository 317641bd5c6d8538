/*!
Test harness for the watcher

Wires a real `Watcher` (real `PracticumClient`) to a homework API stub and a
`MockNotifier`.
*/

use crate::notifier_stub::MockNotifier;
use crate::stub_server::StubServer;
use anyhow::Result;
use homework_watcher::{
    Config, Credentials, PracticumClient, TickOutcome, WatchError, Watcher,
};
use serde_json::Value;
use std::time::Duration;
use tracing_subscriber::filter::LevelFilter;

pub const PRACTICUM_TOKEN: &str = "practicum-token";
pub const TELEGRAM_TOKEN: &str = "telegram-token";
pub const TELEGRAM_CHAT_ID: &str = "12345";
pub const HOMEWORK_PATH: &str = "/api/user_api/homework_statuses/";

/// Route the watcher's `tracing` events and devkit `log` records to the test output
pub fn init_test_logging() {
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(LevelFilter::DEBUG)
        .try_init()
        .ok();
    // Usually a no-op: the subscriber above already bridges `log`
    env_logger::try_init().ok();
}

/// Config pointing at stub URLs, with a tiny retry period
pub fn test_config(endpoint: &str, telegram_api: &str) -> Config {
    let credentials = Credentials::new(
        Some(PRACTICUM_TOKEN.to_string()),
        Some(TELEGRAM_TOKEN.to_string()),
        Some(TELEGRAM_CHAT_ID.to_string()),
    )
    .expect("static test credentials are valid");

    Config::new(credentials)
        .with_endpoint(endpoint)
        .with_telegram_api(telegram_api)
        .with_retry_period(Duration::from_millis(10))
}

pub struct TestHarness {
    pub api: StubServer,
    pub notifier: MockNotifier,
    pub watcher: Watcher<PracticumClient, MockNotifier>,
}

impl TestHarness {
    /// Harness starting with `cursor` as the first `from_date`
    pub async fn new(cursor: i64) -> Result<Self> {
        init_test_logging();

        let api = StubServer::homework_api().await?;
        let config = test_config(&api.url(HOMEWORK_PATH), "http://127.0.0.1:9");
        let notifier = MockNotifier::new();
        let source = PracticumClient::new(&config)?;
        let watcher = Watcher::new(source, notifier.clone(), &config, cursor);

        Ok(Self {
            api,
            notifier,
            watcher,
        })
    }

    /// Queue a 200 response from the homework API
    pub fn respond_with(&self, payload: Value) -> &Self {
        self.api.push_json(200, payload);
        self
    }

    pub async fn tick(&mut self) -> Result<TickOutcome, WatchError> {
        self.watcher.tick().await
    }

    pub async fn run_once(&mut self) -> Option<TickOutcome> {
        self.watcher.run_once().await
    }

    /// `from_date` values sent so far, in order
    pub fn requested_cursors(&self) -> Vec<String> {
        self.api
            .requests()
            .into_iter()
            .filter_map(|r| r.query.get("from_date").cloned())
            .collect()
    }

    pub fn assert_sent(&self, expected: &[&str]) -> Result<()> {
        let sent = self.notifier.sent_messages();
        if sent != expected {
            anyhow::bail!("expected messages {:?}, got {:?}", expected, sent);
        }
        Ok(())
    }
}
