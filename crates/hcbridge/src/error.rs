//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use hcbridge_config::ConfigError;
use hcbridge_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the appliance cloud")]
    #[diagnostic(
        code(hcbridge::connection_failed),
        help(
            "{reason}\n\
             Check your network connection, or the api_url / simulator setting of the profile."
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Rate limited by the appliance cloud")]
    #[diagnostic(
        code(hcbridge::rate_limited),
        help("Retry in {retry_after_secs}s. The vendor limits requests per account and day.")
    )]
    RateLimited { retry_after_secs: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(hcbridge::auth_failed),
        help("Run: hcbridge auth login --profile {profile}")
    )]
    AuthFailed { profile: String, message: String },

    #[error("Profile '{profile}' is not authorized")]
    #[diagnostic(
        code(hcbridge::not_authorized),
        help("Run: hcbridge auth login --profile {profile}")
    )]
    NotAuthorized { profile: String },

    #[error("No client secret configured for profile '{profile}'")]
    #[diagnostic(
        code(hcbridge::no_credentials),
        help(
            "Configure credentials with: hcbridge config init\n\
             Or set client_secret_env in the profile."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Appliance '{ha_id}' not found")]
    #[diagnostic(
        code(hcbridge::not_found),
        help("Run: hcbridge appliances list --all to see paired appliances")
    )]
    NotFound { ha_id: String },

    #[error("Appliance type '{type_name}' is not supported")]
    #[diagnostic(code(hcbridge::unsupported_type))]
    UnsupportedType { type_name: String },

    #[error("Appliance rejected the request: {message}")]
    #[diagnostic(
        code(hcbridge::rejected),
        help("Vendor error key: {key}. Check that the appliance is on and remote control is enabled.")
    )]
    Rejected { message: String, key: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(hcbridge::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(hcbridge::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(hcbridge::profile_not_found),
        help(
            "Create one with: hcbridge config init\n\
             Config file: {path}"
        )
    )]
    ProfileNotFound { name: String, path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(hcbridge::config))]
    Config { message: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(hcbridge::timeout),
        help("Increase timeout with --timeout or in the profile.")
    )]
    Timeout { seconds: u64 },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::RateLimited { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NotAuthorized { .. } | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the active profile name to authorization errors.
    pub fn for_profile(self, profile: &str) -> Self {
        match self {
            Self::AuthFailed { message, .. } => Self::AuthFailed {
                profile: profile.into(),
                message,
            },
            Self::NotAuthorized { .. } => Self::NotAuthorized {
                profile: profile.into(),
            },
            other => other,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                profile: "default".into(),
                message,
            },
            CoreError::ReauthorizationRequired => CliError::NotAuthorized {
                profile: "default".into(),
            },
            CoreError::ConnectionFailed { reason } => CliError::ConnectionFailed { reason },
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::RateLimited { retry_after_secs } => {
                CliError::RateLimited { retry_after_secs }
            }
            CoreError::ApplianceNotFound { ha_id } => CliError::NotFound { ha_id },
            CoreError::UnknownApplianceType { type_name } => {
                CliError::UnsupportedType { type_name }
            }
            CoreError::Rejected { message, key } => CliError::Rejected {
                message,
                key: key.unwrap_or_else(|| "unknown".into()),
            },
            CoreError::Api {
                message,
                key,
                status,
            } => CliError::ApiError {
                code: key
                    .or_else(|| status.map(|s| format!("HTTP {s}")))
                    .unwrap_or_default(),
                message,
            },
            CoreError::Config { message } => CliError::Config { message },
            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { profile } => CliError::ProfileNotFound {
                name: profile,
                path: hcbridge_config::config_path().display().to_string(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

impl From<hcbridge_api::Error> for CliError {
    fn from(err: hcbridge_api::Error) -> Self {
        CoreError::from(err).into()
    }
}
