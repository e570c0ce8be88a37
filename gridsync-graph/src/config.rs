//! Client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Workbook API and identity provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// OAuth2 client ID.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: String,
    /// Scopes requested on refresh.
    pub scope: String,
    /// Base URL for the document API (e.g. `https://graph.microsoft.com/v1.0`).
    pub api_base_url: String,
    /// Identity provider token endpoint.
    pub token_url: String,
    /// Drive prefix workbook items live under.
    pub drive_path: String,
    /// Per-request timeout (seconds).
    pub request_timeout_secs: u64,
    /// Refresh the access token when it expires within this many seconds.
    pub refresh_buffer_secs: u64,
    /// Rate-limit retry behavior.
    pub retry: RetryPolicy,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            scope: "offline_access Files.ReadWrite".to_string(),
            api_base_url: "https://graph.microsoft.com/v1.0".to_string(),
            token_url: "https://login.microsoftonline.com/common/oauth2/v2.0/token".to_string(),
            drive_path: "/me/drive".to_string(),
            request_timeout_secs: 60,
            refresh_buffer_secs: 5 * 60,
            retry: RetryPolicy::default(),
        }
    }
}

impl GraphConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn refresh_buffer(&self) -> Duration {
        Duration::from_secs(self.refresh_buffer_secs)
    }
}

/// How the transport reacts to HTTP 429.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt before giving up.
    pub max_retries: u32,
    /// Backoff unit; retry `i` waits `base_delay_ms * 2^i`.
    pub base_delay_ms: u64,
    /// Upper bound on a server-suggested `Retry-After`.
    pub max_retry_after_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            max_retry_after_secs: 60,
        }
    }
}

impl RetryPolicy {
    /// Exponential delay for the zero-based retry `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }

    /// Caps a server hint.
    pub fn clamp_hint(&self, hint: Duration) -> Duration {
        hint.min(Duration::from_secs(self.max_retry_after_secs))
    }
}
