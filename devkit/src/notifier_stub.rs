/*!
Mock notifier recording every message instead of calling Telegram

Clones share the same record, so a test can keep one handle while the
watcher owns another.
*/

use async_trait::async_trait;
use homework_watcher::{Notifier, NotifyError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MockNotifier {
    sent: Arc<Mutex<Vec<String>>>,
    failing: Arc<AtomicBool>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following delivery fail with an API error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every message attempted so far, failed ones included
    pub fn sent_messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_message(&self) -> Option<String> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send_message(&self, text: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(text.to_string());
        log::info!("[MOCK] message: {}", text);

        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Api {
                description: "Forbidden: bot was blocked by the user".to_string(),
            });
        }
        Ok(())
    }
}
