//! Server-side sessions.
//!
//! The client only ever holds an opaque token (in the session cookie). Everything the handlers
//! need about the caller lives in a [`SessionData`] value kept by a [`SessionStore`].

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use moka::future::Cache;
use rand::prelude::RngExt;
use rand::rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::{
    config::SessionConfig,
    errors::Result,
    types::{Profile, UserId},
};

/// Opaque per-client session key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// 32 random bytes, base64url without padding (43 characters)
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rng().fill(&mut bytes);
        Self(general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// Tokens are credentials; keep them out of logs
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "SessionToken({prefix}..)")
    }
}

/// The one session schema used by every handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: UserId,
    pub user_name: String,
    /// Role at login time; not refreshed until the next login
    pub profile: Profile,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, token: &SessionToken) -> Result<Option<SessionData>>;

    /// Creates or replaces the session under `token`
    async fn set(&self, token: &SessionToken, data: SessionData) -> Result<()>;

    /// Removing an unknown token is not an error
    async fn destroy(&self, token: &SessionToken) -> Result<()>;
}

/// In-process store; sessions expire after sitting idle for the configured timeout.
#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Cache<String, SessionData>,
}

impl MemorySessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Cache::builder().max_capacity(100_000).time_to_idle(idle_timeout).build(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.timeout)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, token: &SessionToken) -> Result<Option<SessionData>> {
        Ok(self.sessions.get(token.as_str()).await)
    }

    async fn set(&self, token: &SessionToken, data: SessionData) -> Result<()> {
        self.sessions.insert(token.as_str().to_string(), data).await;
        Ok(())
    }

    async fn destroy(&self, token: &SessionToken) -> Result<()> {
        self.sessions.invalidate(token.as_str()).await;
        Ok(())
    }
}

/// `Set-Cookie` value carrying a freshly issued token.
pub fn session_cookie(token: &SessionToken, config: &SessionConfig) -> String {
    cookie_with(&config.cookie_name, token.as_str(), config.timeout.as_secs(), config)
}

/// `Set-Cookie` value that makes the browser drop the session cookie.
pub fn clear_session_cookie(config: &SessionConfig) -> String {
    cookie_with(&config.cookie_name, "", 0, config)
}

fn cookie_with(name: &str, value: &str, max_age: u64, config: &SessionConfig) -> String {
    let secure = if config.cookie_secure { "; Secure" } else { "" };
    let same_site = config.cookie_same_site.as_str();
    format!("{name}={value}; Path=/; HttpOnly{secure}; SameSite={same_site}; Max-Age={max_age}")
}

/// Finds `name` in a `Cookie` request header value.
pub fn token_from_cookie_header(header: &str, name: &str) -> Option<SessionToken> {
    header
        .split(';')
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| SessionToken(value.to_string()))
}
