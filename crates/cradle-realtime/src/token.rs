//! Realtime token cache and provider.
//!
//! The realtime SDKs authenticate with a second bearer token, issued by the
//! backend's `/realtime/token` endpoint against the current session token.
//! The cache keeps the issued token in memory only (never persisted) and
//! serves it until its embedded expiry comes within a safety margin, at
//! which point it refetches.
//!
//! The whole check-fetch-store section runs under one async mutex: callers
//! that miss concurrently queue on the lock and re-check the cache after
//! acquiring it, so a cold miss performs exactly one remote fetch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cradle_auth::CredentialStore;
use cradle_core::{SessionToken, decode_expiry_ms, now_ms};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::clients::RealtimeTokenSource;
use crate::errors::{RealtimeError, Result};

/// Fetches a fresh realtime token from the backend.
#[async_trait]
pub trait RealtimeTokenFetcher: Send + Sync {
    /// Issue a token for the given session.
    async fn fetch(&self, session_token: &SessionToken) -> Result<String>;
}

/// Wire shape of the token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// HTTP implementation of the token endpoint.
pub struct HttpTokenFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTokenFetcher {
    /// Create a fetcher against the given API base URL (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RealtimeTokenFetcher for HttpTokenFetcher {
    #[tracing::instrument(skip_all)]
    async fn fetch(&self, session_token: &SessionToken) -> Result<String> {
        let resp = self
            .client
            .get(format!("{}/realtime/token", self.base_url))
            .bearer_auth(session_token.as_str())
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let message = resp.text().await.unwrap_or_default();
            return Err(RealtimeError::TokenFetch { status, message });
        }

        let data: TokenResponse = resp.json().await?;
        Ok(data.token)
    }
}

/// In-memory cache over a [`RealtimeTokenFetcher`].
pub struct TokenCache {
    credentials: Arc<CredentialStore>,
    fetcher: Arc<dyn RealtimeTokenFetcher>,
    refresh_margin_ms: i64,
    cached: Mutex<Option<String>>,
}

impl TokenCache {
    /// Create a cache that refetches once a token has less than
    /// `refresh_margin` of life left.
    pub fn new(
        credentials: Arc<CredentialStore>,
        fetcher: Arc<dyn RealtimeTokenFetcher>,
        refresh_margin: Duration,
    ) -> Self {
        let refresh_margin_ms = i64::try_from(refresh_margin.as_millis()).unwrap_or(i64::MAX);
        Self {
            credentials,
            fetcher,
            refresh_margin_ms,
            cached: Mutex::new(None),
        }
    }

    /// Return a realtime token, from cache when fresh enough.
    ///
    /// Fails with [`RealtimeError::NotAuthenticated`] when no session token
    /// exists; fetch failures propagate untouched (no retries here; the
    /// connection manager decides what a failure means).
    pub async fn token(&self) -> Result<String> {
        self.get_or_fetch().await
    }

    /// Drop the cached token, forcing the next call to fetch.
    pub async fn clear(&self) {
        *self.cached.lock().await = None;
    }

    #[tracing::instrument(skip_all)]
    async fn get_or_fetch(&self) -> Result<String> {
        let Some(session_token) = self.credentials.snapshot().session_token else {
            return Err(RealtimeError::NotAuthenticated);
        };

        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            // A token we cannot decode counts as expired.
            let fresh_until = decode_expiry_ms(token).map(|exp| exp - self.refresh_margin_ms);
            if fresh_until.is_some_and(|t| now_ms() < t) {
                return Ok(token.clone());
            }
            tracing::debug!("cached realtime token stale, refetching");
            *cached = None;
        }

        let token = self.fetcher.fetch(&session_token).await?;
        *cached = Some(token.clone());
        Ok(token)
    }
}

#[async_trait]
impl RealtimeTokenSource for TokenCache {
    async fn realtime_token(&self) -> Result<String> {
        self.get_or_fetch().await
    }

    async fn invalidate(&self) {
        self.clear().await;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
