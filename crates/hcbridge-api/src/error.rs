use thiserror::Error;

/// Top-level error type for the `hcbridge-api` crate.
///
/// Covers every failure mode across the API surfaces: OAuth token
/// exchange, REST calls, and the server-sent event stream.
/// `hcbridge-core` maps these into domain-level errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token exchange or refresh failed, or the API rejected the bearer token.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// No usable token is stored -- the authorization flow must be run again.
    #[error("Re-authorization required -- run the authorization flow again")]
    ReauthorizationRequired,

    /// OAuth `state` parameter failed verification on the callback.
    #[error("Invalid OAuth state: {reason}")]
    InvalidState { reason: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Failed to construct the HTTP client.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Rate limited by the API. Includes retry-after in seconds.
    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── REST API ────────────────────────────────────────────────────
    /// Structured error from the appliance API (`{"error": {key, description}}`).
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        key: Option<String>,
        message: String,
    },

    // ── Event stream ────────────────────────────────────────────────
    /// Event stream could not be opened or dropped mid-read.
    #[error("Event stream error: {0}")]
    Stream(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the failure can only be resolved by re-authorizing.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::ReauthorizationRequired | Self::InvalidState { .. }
        )
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::RateLimited { .. } | Self::Stream(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Vendor error key (e.g. `SDK.Error.HomeAppliance.Connection.Initialization.Failed`).
    pub fn api_error_key(&self) -> Option<&str> {
        match self {
            Self::Api { key, .. } => key.as_deref(),
            _ => None,
        }
    }
}
