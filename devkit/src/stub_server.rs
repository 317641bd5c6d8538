/*!
Scripted HTTP stub server

Binds 127.0.0.1 on a random port, answers every path from a queue of scripted
replies (then a fallback reply) and records each request for assertions.
*/

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::payloads::PayloadBuilder;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub enum StubBody {
    Json(Value),
    /// Sent as-is with a JSON content type, for malformed payloads.
    Raw(String),
}

#[derive(Debug, Clone)]
pub struct StubReply {
    pub status: u16,
    pub body: StubBody,
}

impl StubReply {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: StubBody::Json(body),
        }
    }

    pub fn raw<S: Into<String>>(status: u16, body: S) -> Self {
        Self {
            status,
            body: StubBody::Raw(body.into()),
        }
    }
}

struct StubState {
    replies: Mutex<VecDeque<StubReply>>,
    fallback: Mutex<StubReply>,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct StubServer {
    addr: SocketAddr,
    state: Arc<StubState>,
    task: JoinHandle<()>,
}

impl StubServer {
    /// Start a server answering `fallback` once the scripted queue is empty.
    pub async fn start(fallback: StubReply) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind stub server")?;
        let addr = listener.local_addr()?;

        let state = Arc::new(StubState {
            replies: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(fallback),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(respond).with_state(state.clone());
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("[STUB] server stopped: {}", e);
            }
        });

        log::info!("[STUB] listening on http://{}", addr);
        Ok(Self { addr, state, task })
    }

    /// Stub for the homework API. Falls back to an empty homework list.
    pub async fn homework_api() -> Result<Self> {
        Self::start(StubReply::json(200, PayloadBuilder::empty(0))).await
    }

    /// Stub for the Telegram Bot API. Falls back to `{"ok": true}`.
    pub async fn telegram() -> Result<Self> {
        Self::start(StubReply::json(200, PayloadBuilder::telegram_ok())).await
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Queue a reply for the next unanswered request
    pub fn push_reply(&self, reply: StubReply) {
        self.state.replies.lock().unwrap().push_back(reply);
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.push_reply(StubReply::json(status, body));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn respond(
    State(state): State<Arc<StubState>>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query,
        authorization,
        body: serde_json::from_slice(&body).ok(),
    });

    let reply = state
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| state.fallback.lock().unwrap().clone());

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match reply.body {
        StubBody::Json(value) => (status, Json(value)).into_response(),
        StubBody::Raw(text) => (status, [(header::CONTENT_TYPE, "application/json")], text).into_response(),
    }
}
