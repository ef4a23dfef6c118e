// ── Runtime bridge configuration ──
//
// Describes how to reach the appliance cloud and how aggressively to
// reconnect. Carries credentials but never touches disk; the CLI builds
// a `BridgeConfig` from its profile and hands it in.

use std::time::Duration;

use hcbridge_api::auth::DEFAULT_REFRESH_MARGIN;
use hcbridge_api::{OAuthConfig, StreamConfig, TransportConfig};
use url::Url;

use crate::model::HaId;

/// Production API root.
pub const DEFAULT_API_URL: &str = "https://api.home-connect.com";

/// Vendor simulator API root.
pub const SIMULATOR_API_URL: &str = "https://simulator.home-connect.com";

/// Configuration for one account's bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// API root for REST calls and event streams.
    pub api_url: Url,
    /// OAuth application credentials (usually sharing `api_url` as base).
    pub oauth: OAuthConfig,
    /// Timeouts for token exchange and REST calls.
    pub transport: TransportConfig,
    /// Reconnect backoff and STOP grace period.
    pub stream: StreamConfig,
    /// How long before expiry an access token is refreshed.
    pub refresh_margin: Duration,
    /// Appliances to bridge. Empty means every paired appliance.
    pub selected_appliances: Vec<HaId>,
}

impl BridgeConfig {
    /// Defaults for everything but the OAuth credentials. The API root is
    /// taken from the OAuth base URL.
    pub fn new(oauth: OAuthConfig) -> Self {
        Self {
            api_url: oauth.base_url.clone(),
            oauth,
            transport: TransportConfig::default(),
            stream: StreamConfig::default(),
            refresh_margin: DEFAULT_REFRESH_MARGIN,
            selected_appliances: Vec::new(),
        }
    }

    /// `true` if `ha_id` passes the appliance selection.
    pub fn is_selected(&self, ha_id: &HaId) -> bool {
        self.selected_appliances.is_empty() || self.selected_appliances.contains(ha_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn oauth() -> OAuthConfig {
        OAuthConfig {
            base_url: Url::parse(SIMULATOR_API_URL).unwrap(),
            client_id: "id".into(),
            client_secret: SecretString::from("secret".to_string()),
            redirect_uri: "http://localhost/callback".into(),
            scope: "IdentifyAppliance".into(),
        }
    }

    #[test]
    fn defaults_follow_oauth_base() {
        let config = BridgeConfig::new(oauth());
        assert_eq!(config.api_url.as_str(), "https://simulator.home-connect.com/");
        assert_eq!(config.refresh_margin, Duration::from_secs(60));
        assert_eq!(config.stream.base_retry, Duration::from_secs(15));
        assert_eq!(config.stream.max_retry, Duration::from_secs(900));
        assert_eq!(config.stream.grace_period, Duration::from_secs(30));
    }

    #[test]
    fn empty_selection_means_all() {
        let mut config = BridgeConfig::new(oauth());
        let dishwasher = HaId::from("BOSCH-SMV68TX06E-70C62F17C8E4");
        assert!(config.is_selected(&dishwasher));

        config.selected_appliances = vec![HaId::from("SIEMENS-HB676G5S6-68A40E251CB1")];
        assert!(!config.is_selected(&dishwasher));
    }
}
