//! Bearer token acquisition.

use crate::config::GraphConfig;
use crate::credentials::{CredentialStore, StoredCredential};
use crate::error::{GraphError, GraphResult};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: u64 = 3_600;

/// Anything that can hand the transport a bearer token.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// Returns a token that is valid right now.
    async fn access_token(&self) -> GraphResult<String>;

    /// Called after the API rejected the token with 401.
    async fn invalidate(&self) {}
}

/// A fixed token, for tests and one-off tools.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> GraphResult<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

/// Keeps the stored credential fresh.
///
/// Reads go through an in-memory copy. Refreshes are single-flight: the
/// first caller to find the token expiring takes `refresh_lock`, and anyone
/// queued behind it re-checks the cache before doing any work.
pub struct TokenProvider {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    refresh_buffer: Duration,
    store: Arc<dyn CredentialStore>,
    cached: RwLock<Option<StoredCredential>>,
    refresh_lock: Mutex<()>,
}

impl TokenProvider {
    pub fn new(config: &GraphConfig, store: Arc<dyn CredentialStore>) -> GraphResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| GraphError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope.clone(),
            refresh_buffer: config.refresh_buffer(),
            store,
            cached: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Returns a token valid for at least the refresh buffer.
    pub async fn valid_token(&self) -> GraphResult<String> {
        if let Some(token) = self.cached_if_fresh().await {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(token) = self.cached_if_fresh().await {
            return Ok(token);
        }

        let credential = self
            .store
            .load()
            .await?
            .ok_or_else(|| GraphError::Auth("no stored credential, reconnect required".into()))?;

        if !credential.expires_within(self.refresh_buffer) {
            let token = credential.access_token.clone();
            *self.cached.write().await = Some(credential);
            return Ok(token);
        }

        let refreshed = self.refresh(&credential).await?;
        self.store.save(&refreshed).await?;
        let token = refreshed.access_token.clone();
        *self.cached.write().await = Some(refreshed);
        Ok(token)
    }

    async fn cached_if_fresh(&self) -> Option<String> {
        let guard = self.cached.read().await;
        guard
            .as_ref()
            .filter(|c| !c.expires_within(self.refresh_buffer))
            .map(|c| c.access_token.clone())
    }

    /// Exchanges the refresh token for a new access token.
    async fn refresh(&self, current: &StoredCredential) -> GraphResult<StoredCredential> {
        let refresh_token = current
            .refresh_token
            .clone()
            .ok_or_else(|| GraphError::Auth("no refresh token available".into()))?;

        debug!("Refreshing access token");

        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| GraphError::Auth(format!("token refresh failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            warn!(%status, "Token refresh rejected");
            return Err(GraphError::Auth(format!("token refresh failed: {error}")));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| GraphError::Auth(format!("failed to parse token response: {e}")))?;

        let lifetime = token_response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let expires_at =
            Utc::now() + chrono::Duration::seconds(lifetime.min(u64::from(u32::MAX)) as i64);

        info!(expires_in = lifetime, "Access token refreshed");

        Ok(StoredCredential {
            access_token: token_response.access_token,
            refresh_token: token_response.refresh_token.or(Some(refresh_token)),
            expires_at,
        })
    }
}

#[async_trait]
impl AccessTokenSource for TokenProvider {
    async fn access_token(&self) -> GraphResult<String> {
        self.valid_token().await
    }

    async fn invalidate(&self) {
        *self.cached.write().await = None;
    }
}
