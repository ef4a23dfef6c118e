// Access/refresh token holder with single-flight refresh.
//
// Every REST call and stream connect asks the store for a valid access
// token. When the token is inside the refresh margin, exactly one caller
// performs the refresh exchange while the others wait on the same lock
// and pick up its result.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

use super::client::OAuthClient;
use crate::error::Error;

/// Default safety margin before expiry at which a refresh is triggered.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ── Token ────────────────────────────────────────────────────────────

/// An OAuth token pair with its absolute expiry.
#[derive(Debug, Clone)]
pub struct Token {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_at_ms: i64,
}

impl Token {
    pub fn new(access_token: String, refresh_token: String, expires_at_ms: i64) -> Self {
        Self {
            access_token: SecretString::from(access_token),
            refresh_token: SecretString::from(refresh_token),
            expires_at_ms,
        }
    }

    /// `true` once `now` is inside the refresh margin.
    pub fn needs_refresh(&self, now_ms: i64, margin: Duration) -> bool {
        let margin_ms = i64::try_from(margin.as_millis()).unwrap_or(i64::MAX);
        now_ms >= self.expires_at_ms.saturating_sub(margin_ms)
    }

    /// `true` once the token is past its natural expiry.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }

    /// Serialize for persistence (keyring, file). Exposes the secrets.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string(&PersistedToken::from(self)).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: String::new(),
        })
    }

    /// Restore a token written by [`to_json`](Self::to_json).
    pub fn from_json(raw: &str) -> Result<Self, Error> {
        let stored: PersistedToken =
            serde_json::from_str(raw).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: String::new(),
            })?;
        Ok(Self::new(
            stored.access_token,
            stored.refresh_token,
            stored.expires_at_ms,
        ))
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedToken {
    access_token: String,
    refresh_token: String,
    expires_at_ms: i64,
}

impl From<&Token> for PersistedToken {
    fn from(token: &Token) -> Self {
        Self {
            access_token: token.access_token.expose_secret().to_owned(),
            refresh_token: token.refresh_token.expose_secret().to_owned(),
            expires_at_ms: token.expires_at_ms,
        }
    }
}

// ── TokenStore ───────────────────────────────────────────────────────

/// Thread-safe holder of the current token.
///
/// The token is only ever replaced by results of the [`OAuthClient`]
/// (code exchange or refresh), restored from persistence, or cleared
/// when the API rejects it. Subscribers see every replacement.
pub struct TokenStore {
    oauth: OAuthClient,
    margin: Duration,
    current: watch::Sender<Option<Token>>,
    refresh_lock: Mutex<()>,
}

impl TokenStore {
    pub fn new(oauth: OAuthClient) -> Self {
        Self::with_margin(oauth, DEFAULT_REFRESH_MARGIN)
    }

    pub fn with_margin(oauth: OAuthClient, margin: Duration) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            oauth,
            margin,
            current,
            refresh_lock: Mutex::new(()),
        }
    }

    /// The OAuth client used for exchanges.
    pub fn oauth(&self) -> &OAuthClient {
        &self.oauth
    }

    /// Restore a previously persisted token.
    pub fn load(&self, token: Token) {
        self.current.send_replace(Some(token));
    }

    /// Snapshot of the current token, if any.
    pub fn current(&self) -> Option<Token> {
        self.current.borrow().clone()
    }

    /// `true` if a token is held (it may still need a refresh).
    pub fn is_authorized(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Watch token replacements (e.g. to persist rotated refresh tokens).
    pub fn subscribe(&self) -> watch::Receiver<Option<Token>> {
        self.current.subscribe()
    }

    /// Drop the stored token, forcing re-authorization.
    pub fn invalidate(&self) {
        if self.current.send_replace(None).is_some() {
            warn!("stored token invalidated -- re-authorization required");
        }
    }

    /// Exchange an authorization code and store the resulting token.
    pub async fn authorize(&self, code: &str) -> Result<(), Error> {
        let token = self.oauth.exchange_code(code).await?;
        self.current.send_replace(Some(token));
        debug!("authorization code exchanged");
        Ok(())
    }

    /// Validate a callback (`?code=…&state=…`) and store the resulting token.
    pub async fn complete_callback(&self, callback: &str) -> Result<(), Error> {
        let token = self.oauth.handle_callback(callback, now_ms()).await?;
        self.current.send_replace(Some(token));
        debug!("authorization callback completed");
        Ok(())
    }

    /// Return a usable access token, refreshing first if it is near expiry.
    ///
    /// Concurrent callers never issue more than one refresh: the first to
    /// take the refresh lock performs it, the rest re-check the stored
    /// token once they acquire the lock and reuse the fresh one.
    ///
    /// A failed refresh leaves the store untouched. If the old token has
    /// not yet reached its natural expiry it is returned anyway.
    pub async fn get_valid_token(&self) -> Result<SecretString, Error> {
        if let Some(access) = self.fresh_access_token(now_ms())? {
            return Ok(access);
        }

        let _guard = self.refresh_lock.lock().await;

        let now = now_ms();
        if let Some(access) = self.fresh_access_token(now)? {
            return Ok(access);
        }
        let stale = self.current().ok_or(Error::ReauthorizationRequired)?;

        debug!(expires_at_ms = stale.expires_at_ms, "refreshing access token");
        match self.oauth.refresh(&stale).await {
            Ok(fresh) => {
                let access = fresh.access_token.clone();
                self.current.send_replace(Some(fresh));
                debug!("access token refreshed");
                Ok(access)
            }
            Err(e) if !stale.is_expired(now) => {
                warn!(error = %e, "token refresh failed, using still-valid token");
                Ok(stale.access_token)
            }
            Err(e) => Err(e),
        }
    }

    /// The stored access token if it is outside the refresh margin.
    fn fresh_access_token(&self, now_ms: i64) -> Result<Option<SecretString>, Error> {
        let guard = self.current.borrow();
        let token = guard.as_ref().ok_or(Error::ReauthorizationRequired)?;
        if token.needs_refresh(now_ms, self.margin) {
            Ok(None)
        } else {
            Ok(Some(token.access_token.clone()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn refresh_is_due_inside_margin() {
        let token = Token::new("a".into(), "r".into(), 100_000);
        let margin = Duration::from_secs(60);
        assert!(!token.needs_refresh(39_999, margin));
        assert!(token.needs_refresh(40_000, margin));
        assert!(!token.is_expired(99_999));
        assert!(token.is_expired(100_000));
    }

    #[test]
    fn token_json_roundtrip_keeps_secrets() {
        let token = Token::new("access".into(), "refresh".into(), 42);
        let restored = Token::from_json(&token.to_json().unwrap()).unwrap();
        assert_eq!(restored.access_token.expose_secret(), "access");
        assert_eq!(restored.refresh_token.expose_secret(), "refresh");
        assert_eq!(restored.expires_at_ms, 42);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let token = Token::new("access-secret".into(), "refresh-secret".into(), 42);
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("access-secret"));
        assert!(!rendered.contains("refresh-secret"));
    }
}
