//! Per-invocation bridge construction and token persistence.

use std::time::Duration;

use hcbridge_api::Token;
use hcbridge_config::{Config, load_config_or_default, profile_to_bridge_config};
use hcbridge_core::{Bridge, BridgeConfig};
use tracing::debug;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// A bridge for the active profile.
pub struct Session {
    pub bridge: Bridge,
    pub profile: String,
    /// Expiry of the token loaded at start, to detect rotation.
    loaded_expiry: Option<i64>,
}

impl Session {
    /// Build the bridge without requiring a stored token.
    pub fn unauthorized(global: &GlobalOpts) -> Result<Self, CliError> {
        let cfg = load_config_or_default();
        let (profile, config) = bridge_config(&cfg, global)?;
        let bridge = Bridge::new(config)?;
        Ok(Self {
            bridge,
            profile,
            loaded_expiry: None,
        })
    }

    /// Build the bridge and load the persisted token.
    pub fn open(global: &GlobalOpts) -> Result<Self, CliError> {
        let mut session = Self::unauthorized(global)?;
        let token = hcbridge_config::load_token(&session.profile)?.ok_or_else(|| {
            CliError::NotAuthorized {
                profile: session.profile.clone(),
            }
        })?;
        session.loaded_expiry = Some(token.expires_at_ms);
        session.bridge.tokens().load(token);
        Ok(session)
    }

    /// Write the current token back if it changed since the session opened.
    pub fn persist_token(&self) -> Result<(), CliError> {
        let Some(token) = self.bridge.tokens().current() else {
            return Ok(());
        };
        if Some(token.expires_at_ms) == self.loaded_expiry {
            return Ok(());
        }
        save(&self.profile, &token)
    }

    /// Persist every token the store publishes until the store is dropped.
    pub fn spawn_token_persister(&self) -> tokio::task::JoinHandle<()> {
        let mut rx = self.bridge.tokens().subscribe();
        let profile = self.profile.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let token = rx.borrow_and_update().clone();
                if let Some(token) = token {
                    if let Err(e) = save(&profile, &token) {
                        tracing::warn!(error = %e, "could not persist rotated token");
                    }
                }
            }
        })
    }
}

fn save(profile: &str, token: &Token) -> Result<(), CliError> {
    hcbridge_config::save_token(profile, token)?;
    debug!(profile, "token persisted");
    Ok(())
}

/// Resolve the active profile and translate it, applying CLI overrides.
fn bridge_config(cfg: &Config, global: &GlobalOpts) -> Result<(String, BridgeConfig), CliError> {
    let name = cfg.profile_name(global.profile.as_deref());
    let profile = cfg.profile(&name)?;
    let mut config = profile_to_bridge_config(profile, &name)?;

    if let Some(secs) = global.timeout {
        let timeout = Duration::from_secs(secs);
        config.transport.timeout = timeout;
        config.transport.connect_timeout = timeout;
    }
    Ok((name, config))
}
