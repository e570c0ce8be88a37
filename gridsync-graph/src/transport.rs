//! Rate-limit aware HTTP transport.
//!
//! Every call goes through [`Transport::send`], which attaches a bearer
//! token, retries HTTP 429 responses and turns everything else that is not
//! 2xx into a [`GraphError`]. Retries happen inline: the caller's future
//! simply takes longer to resolve.

use crate::config::{GraphConfig, RetryPolicy};
use crate::error::{GraphError, GraphResult};
use crate::token::AccessTokenSource;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Standard error envelope: `{"error": {"code": "...", "message": "..."}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Authenticated JSON transport for the document API.
pub struct Transport {
    client: Client,
    base_url: String,
    tokens: Arc<dyn AccessTokenSource>,
    retry: RetryPolicy,
}

impl Transport {
    pub fn new(config: &GraphConfig, tokens: Arc<dyn AccessTokenSource>) -> GraphResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| GraphError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            tokens,
            retry: config.retry.clone(),
        })
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub async fn get(&self, path: &str) -> GraphResult<Value> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> GraphResult<Value> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> GraphResult<Value> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    /// Relative paths are joined onto the API base; absolute URLs (paging
    /// links) are used as-is.
    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> GraphResult<Value> {
        let url = self.url(path);
        let mut attempt: u32 = 0;

        loop {
            let token = self.tokens.access_token().await?;
            let mut request = self
                .client
                .request(method.clone(), &url)
                .bearer_auth(&token);
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!(%method, path, attempt, "Sending request");

            let response = request
                .send()
                .await
                .map_err(|e| GraphError::Network(format!("{method} {path} failed: {e}")))?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS && attempt < self.retry.max_retries
            {
                let delay = match retry_after(&response) {
                    Some(hint) => self.retry.clamp_hint(hint),
                    None => self.retry.backoff(attempt),
                };
                warn!(
                    %method,
                    path,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limited, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            return self.read_response(&method, path, response).await;
        }
    }

    async fn read_response(
        &self,
        method: &Method,
        path: &str,
        response: Response,
    ) -> GraphResult<Value> {
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let text = response
            .text()
            .await
            .map_err(|e| GraphError::Network(format!("{method} {path}: failed to read body: {e}")))?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&text)?);
        }

        let (code, message) = parse_error(status, &text);

        if status == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
            return Err(GraphError::Auth(format!("{method} {path} rejected: {message}")));
        }

        warn!(%method, path, status = status.as_u16(), %message, "Request failed");
        Err(GraphError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }
}

/// Reads an integer `Retry-After` header.
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn parse_error(status: StatusCode, body: &str) -> (Option<String>, String) {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: ErrorBody { code, message: Some(message) },
        }) if !message.is_empty() => (code, message),
        Ok(ErrorEnvelope { error }) => (
            error.code,
            format!("request failed with status {}", status.as_u16()),
        ),
        Err(_) => (None, format!("request failed with status {}", status.as_u16())),
    }
}
