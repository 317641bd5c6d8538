/*!
# Homework DevKit - stubs and helpers for testing the watcher

- HTTP stub server standing in for the homework API and the Telegram Bot API
- Recording notifier (no network)
- Payload builders matching the API shapes
- Test harness wiring a real `Watcher` to the stubs
*/

pub mod payloads;
pub mod notifier_stub;
pub mod stub_server;
pub mod test_utils;

pub use notifier_stub::MockNotifier;
pub use payloads::PayloadBuilder;
pub use stub_server::{RecordedRequest, StubBody, StubReply, StubServer};
pub use test_utils::TestHarness;
