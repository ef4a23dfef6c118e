// ── Core error types ──
//
// Domain-level errors from hcbridge-core. Consumers see appliance and
// authorization failures, not HTTP status codes or JSON parse errors.
// The `From<hcbridge_api::Error>` impl translates transport-layer errors.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Authorization ────────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not authorized -- run the authorization flow again")]
    ReauthorizationRequired,

    // ── Connection ───────────────────────────────────────────────────
    #[error("Cannot reach the appliance cloud: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── Appliances ───────────────────────────────────────────────────
    #[error("Appliance not found: {ha_id}")]
    ApplianceNotFound { ha_id: String },

    #[error("Unsupported appliance type: {type_name}")]
    UnknownApplianceType { type_name: String },

    /// The appliance refused the operation in its current state.
    #[error("Operation rejected by appliance: {message}")]
    Rejected {
        message: String,
        /// Vendor error key, e.g. `SDK.Error.WrongOperationState`.
        key: Option<String>,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        key: Option<String>,
        status: Option<u16>,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` if the operator must re-run the authorization flow.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed { .. } | Self::ReauthorizationRequired
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<hcbridge_api::Error> for CoreError {
    fn from(err: hcbridge_api::Error) -> Self {
        use hcbridge_api::Error as ApiError;

        match err {
            ApiError::Authentication { message } => CoreError::AuthenticationFailed { message },
            ApiError::ReauthorizationRequired => CoreError::ReauthorizationRequired,
            ApiError::InvalidState { reason } => CoreError::AuthenticationFailed {
                message: format!("invalid OAuth state: {reason}"),
            },
            ApiError::Transport(ref e) if e.is_timeout() => CoreError::Timeout { timeout_secs: 0 },
            ApiError::Transport(e) => CoreError::ConnectionFailed {
                reason: e.to_string(),
            },
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                reason: format!("TLS error: {msg}"),
            },
            ApiError::RateLimited { retry_after_secs } => {
                CoreError::RateLimited { retry_after_secs }
            }
            ApiError::Api {
                status: 409,
                key,
                message,
            } => CoreError::Rejected { message, key },
            ApiError::Api {
                status,
                key,
                message,
            } => CoreError::Api {
                message,
                key,
                status: Some(status),
            },
            ApiError::Stream(reason) => CoreError::ConnectionFailed {
                reason: format!("event stream: {reason}"),
            },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_maps_to_rejected_with_key() {
        let err = CoreError::from(hcbridge_api::Error::Api {
            status: 409,
            key: Some("SDK.Error.WrongOperationState".into()),
            message: "not ready".into(),
        });
        match err {
            CoreError::Rejected { key, .. } => {
                assert_eq!(key.as_deref(), Some("SDK.Error.WrongOperationState"));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn auth_errors_stay_auth_errors() {
        assert!(CoreError::from(hcbridge_api::Error::ReauthorizationRequired).is_auth_failure());
        assert!(
            CoreError::from(hcbridge_api::Error::Authentication {
                message: "expired".into()
            })
            .is_auth_failure()
        );
        assert!(!CoreError::from(hcbridge_api::Error::Stream("eof".into())).is_auth_failure());
    }
}
