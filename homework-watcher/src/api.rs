//! Homework status API client
//!
//! One GET per tick with `Authorization: OAuth <token>` and `from_date=<cursor>`.
//! The body is returned untyped; shape checks live in `response`.

use crate::config::Config;
use crate::error::WatchError;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

/// Source of homework status payloads.
#[async_trait]
pub trait HomeworkSource {
    async fn fetch(&self, from_date: i64) -> Result<Value, WatchError>;
}

#[derive(Debug, Clone)]
pub struct PracticumClient {
    client: Client,
    endpoint: String,
    auth_header: String,
}

impl PracticumClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            auth_header: format!("OAuth {}", config.credentials.practicum_token()),
        })
    }
}

#[async_trait]
impl HomeworkSource for PracticumClient {
    async fn fetch(&self, from_date: i64) -> Result<Value, WatchError> {
        debug!("Requesting {} with from_date={}", self.endpoint, from_date);

        let response = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, &self.auth_header)
            .query(&[("from_date", from_date)])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(WatchError::EndpointStatus {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
                from_date,
                body,
            });
        }

        let payload: Value = response.json().await?;
        Ok(payload)
    }
}
