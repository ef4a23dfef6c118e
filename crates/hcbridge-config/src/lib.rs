//! Shared configuration for hcbridge.
//!
//! TOML profiles, client-secret resolution (env + keyring + plaintext),
//! OAuth token persistence in the system keyring, and translation to
//! `hcbridge_core::BridgeConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use hcbridge_api::{OAuthConfig, StreamConfig, Token, TransportConfig};
use hcbridge_core::config::{DEFAULT_API_URL, SIMULATOR_API_URL};
use hcbridge_core::{BridgeConfig, HaId};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

const KEYRING_SERVICE: &str = "hcbridge";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no client secret configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{profile}' not found in config")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("stored token is unreadable: {0}")]
    Token(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Profile name to use: explicit choice, then `default_profile`, then `"default"`.
    pub fn profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named account profile (one registered OAuth application).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// API root. Overrides `simulator` when set.
    pub api_url: Option<String>,

    /// Use the vendor simulator instead of production.
    #[serde(default)]
    pub simulator: bool,

    /// OAuth client id of the registered application.
    pub client_id: String,

    /// Client secret in plaintext. Prefer the keyring or an env var.
    pub client_secret: Option<String>,

    /// Environment variable name containing the client secret.
    pub client_secret_env: Option<String>,

    /// Redirect URI registered with the application.
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// Space-separated OAuth scopes.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// haIds to bridge. Empty means all paired appliances.
    #[serde(default)]
    pub appliances: Vec<String>,

    /// Override request timeout (seconds).
    pub timeout: Option<u64>,

    /// Seconds before expiry at which the access token is refreshed.
    pub refresh_margin: Option<u64>,

    /// First stream reconnect delay (seconds).
    pub retry_base: Option<u64>,

    /// Stream reconnect delay ceiling (seconds).
    pub retry_max: Option<u64>,

    /// STOP grace period (seconds).
    pub grace_period: Option<u64>,

    /// Silence after which an open event stream is reconnected (seconds).
    pub idle_timeout: Option<u64>,
}

fn default_redirect_uri() -> String {
    "http://localhost:8080/oauth/callback".into()
}
fn default_scope() -> String {
    "IdentifyAppliance Monitor Control Settings".into()
}

impl Profile {
    /// A profile with defaults for everything but the client id.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            api_url: None,
            simulator: false,
            client_id: client_id.into(),
            client_secret: None,
            client_secret_env: None,
            redirect_uri: default_redirect_uri(),
            scope: default_scope(),
            appliances: Vec::new(),
            timeout: None,
            refresh_margin: None,
            retry_base: None,
            retry_max: None,
            grace_period: None,
            idle_timeout: None,
        }
    }

    /// The API root this profile talks to.
    pub fn resolved_api_url(&self) -> Result<Url, ConfigError> {
        let raw = match (&self.api_url, self.simulator) {
            (Some(url), _) => url.as_str(),
            (None, true) => SIMULATOR_API_URL,
            (None, false) => DEFAULT_API_URL,
        };
        Url::parse(raw).map_err(|e| ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("{raw}: {e}"),
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "hcbridge", "hcbridge").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("hcbridge");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + `HCBRIDGE_*` environment overrides.
///
/// Nested keys use a double underscore, e.g.
/// `HCBRIDGE_PROFILES__HOME__SIMULATOR=true`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HCBRIDGE_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str, item: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/{item}"),
    )?)
}

/// Resolve the OAuth client secret from the credential chain.
pub fn resolve_client_secret(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's client_secret_env → env var lookup
    if let Some(ref env_name) = profile.client_secret_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name, "client-secret") {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref secret) = profile.client_secret {
        return Ok(SecretString::from(secret.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store the client secret in the system keyring.
pub fn store_client_secret(profile_name: &str, secret: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name, "client-secret")?.set_password(secret)?;
    Ok(())
}

// ── Token persistence ───────────────────────────────────────────────

/// The persisted OAuth token for `profile_name`, if any.
pub fn load_token(profile_name: &str) -> Result<Option<Token>, ConfigError> {
    match keyring_entry(profile_name, "token")?.get_password() {
        Ok(raw) => Token::from_json(&raw)
            .map(Some)
            .map_err(|e| ConfigError::Token(e.to_string())),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Persist (or replace) the OAuth token for `profile_name`.
pub fn save_token(profile_name: &str, token: &Token) -> Result<(), ConfigError> {
    let raw = token
        .to_json()
        .map_err(|e| ConfigError::Token(e.to_string()))?;
    keyring_entry(profile_name, "token")?.set_password(&raw)?;
    debug!(profile = profile_name, "token saved to keyring");
    Ok(())
}

/// Remove the persisted token. Returns `false` if none was stored.
pub fn delete_token(profile_name: &str) -> Result<bool, ConfigError> {
    match keyring_entry(profile_name, "token")?.delete_credential() {
        Ok(()) => Ok(true),
        Err(keyring::Error::NoEntry) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

// ── Profile → BridgeConfig ──────────────────────────────────────────

/// OAuth application settings for a profile.
pub fn profile_to_oauth_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<OAuthConfig, ConfigError> {
    if profile.client_id.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "client_id".into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(OAuthConfig {
        base_url: profile.resolved_api_url()?,
        client_id: profile.client_id.clone(),
        client_secret: resolve_client_secret(profile, profile_name)?,
        redirect_uri: profile.redirect_uri.clone(),
        scope: profile.scope.clone(),
    })
}

/// Build a `BridgeConfig` from a profile.
pub fn profile_to_bridge_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<BridgeConfig, ConfigError> {
    let oauth = profile_to_oauth_config(profile, profile_name)?;
    let mut config = BridgeConfig::new(oauth);

    let timeout = Duration::from_secs(profile.timeout.unwrap_or_else(default_timeout));
    config.transport = TransportConfig {
        timeout,
        connect_timeout: timeout,
    };

    let defaults = StreamConfig::default();
    config.stream = StreamConfig {
        base_retry: profile
            .retry_base
            .map_or(defaults.base_retry, Duration::from_secs),
        max_retry: profile
            .retry_max
            .map_or(defaults.max_retry, Duration::from_secs),
        grace_period: profile
            .grace_period
            .map_or(defaults.grace_period, Duration::from_secs),
        idle_timeout: profile
            .idle_timeout
            .map_or(defaults.idle_timeout, Duration::from_secs),
    };
    if config.stream.base_retry > config.stream.max_retry {
        return Err(ConfigError::Validation {
            field: "retry_base".into(),
            reason: "must not exceed retry_max".into(),
        });
    }

    if let Some(margin) = profile.refresh_margin {
        config.refresh_margin = Duration::from_secs(margin);
    }
    config.selected_appliances = profile
        .appliances
        .iter()
        .map(|id| HaId::from(id.as_str()))
        .collect();

    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn api_url_precedence() {
        let mut profile = Profile::new("id");
        assert_eq!(
            profile.resolved_api_url().unwrap().as_str(),
            "https://api.home-connect.com/"
        );

        profile.simulator = true;
        assert_eq!(
            profile.resolved_api_url().unwrap().as_str(),
            "https://simulator.home-connect.com/"
        );

        profile.api_url = Some("http://127.0.0.1:9000".into());
        assert_eq!(
            profile.resolved_api_url().unwrap().as_str(),
            "http://127.0.0.1:9000/"
        );

        profile.api_url = Some("not a url".into());
        assert!(matches!(
            profile.resolved_api_url(),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn profile_name_falls_back_to_default() {
        let mut config = Config::default();
        assert_eq!(config.profile_name(Some("home")), "home");
        assert_eq!(config.profile_name(None), "default");
        config.default_profile = None;
        assert_eq!(config.profile_name(None), "default");
        assert!(matches!(
            config.profile("missing"),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }
}
