//! Refresh-token session store
//!
//! Holds the single currently-valid refresh token per user, keyed by
//! user ID with a TTL equal to the refresh-token lifetime. The stored
//! value, not the token's signature, is the source of truth for
//! revocation: `put` overwrites unconditionally, which is exactly what
//! makes "one live session per account" hold. Last writer wins, so no
//! extra locking is needed under concurrent logins.
//!
//! The store is injected as `Arc<dyn SessionStore>` so tests can
//! substitute the in-memory implementation for Redis.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

/// Session store failure; always retryable from the caller's view
#[derive(Error, Debug)]
pub enum SessionStoreError {
    #[error("session store timed out")]
    Timeout,

    #[error("session store backend error: {0}")]
    Backend(String),
}

impl From<SessionStoreError> for crate::error::ApiError {
    fn from(err: SessionStoreError) -> Self {
        crate::error::ApiError::Transient(err.to_string())
    }
}

/// Key-value store for the per-user refresh token
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store the refresh token for a user, overwriting any existing
    /// entry. The overwrite is what invalidates a prior session.
    async fn put(&self, user_id: Uuid, token: &str, ttl: Duration)
        -> Result<(), SessionStoreError>;

    /// Fetch the currently-valid refresh token for a user, if any
    async fn get(&self, user_id: Uuid) -> Result<Option<String>, SessionStoreError>;

    /// Revoke the user's session
    async fn delete(&self, user_id: Uuid) -> Result<(), SessionStoreError>;
}

fn session_key(user_id: Uuid) -> String {
    format!("refresh_token:{}", user_id)
}

/// Redis-backed session store
///
/// Every operation runs under a bounded timeout and is retried once
/// before surfacing a transient error; a slow Redis never hangs a
/// request.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    op_timeout: Duration,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager, op_timeout: Duration) -> Self {
        Self { conn, op_timeout }
    }

    async fn with_retry<F, Fut, T>(&self, op: F) -> Result<T, SessionStoreError>
    where
        F: Fn(ConnectionManager) -> Fut,
        Fut: std::future::Future<Output = redis::RedisResult<T>>,
    {
        let mut last_err = SessionStoreError::Timeout;
        for attempt in 0..2 {
            match timeout(self.op_timeout, op(self.conn.clone())).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => {
                    warn!(attempt, "Redis operation failed: {}", e);
                    last_err = SessionStoreError::Backend(e.to_string());
                }
                Err(_) => {
                    warn!(attempt, "Redis operation timed out");
                    last_err = SessionStoreError::Timeout;
                }
            }
        }
        Err(last_err)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(
        &self,
        user_id: Uuid,
        token: &str,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let key = session_key(user_id);
        let token = token.to_string();
        let ttl_secs = ttl.as_secs();
        self.with_retry(move |mut conn| {
            let key = key.clone();
            let token = token.clone();
            async move { conn.set_ex::<_, _, ()>(key, token, ttl_secs).await }
        })
        .await
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<String>, SessionStoreError> {
        let key = session_key(user_id);
        self.with_retry(move |mut conn| {
            let key = key.clone();
            async move { conn.get::<_, Option<String>>(key).await }
        })
        .await
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), SessionStoreError> {
        let key = session_key(user_id);
        self.with_retry(move |mut conn| {
            let key = key.clone();
            async move { conn.del::<_, ()>(key).await }
        })
        .await
    }
}

/// In-memory session store for tests and local development
#[derive(Default)]
pub struct InMemorySessionStore {
    entries: Mutex<HashMap<Uuid, (String, Instant)>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(
        &self,
        user_id: Uuid,
        token: &str,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| SessionStoreError::Backend(e.to_string()))?;
        entries.insert(user_id, (token.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<String>, SessionStoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| SessionStoreError::Backend(e.to_string()))?;
        match entries.get(&user_id) {
            Some((_, expires_at)) if *expires_at <= Instant::now() => {
                entries.remove(&user_id);
                Ok(None)
            }
            Some((token, _)) => Ok(Some(token.clone())),
            None => Ok(None),
        }
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), SessionStoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| SessionStoreError::Backend(e.to_string()))?;
        entries.remove(&user_id);
        Ok(())
    }
}
