#![allow(clippy::unwrap_used)]

use std::time::Duration;

use hcbridge_config::{
    Config, ConfigError, Profile, load_config_from, profile_to_bridge_config,
    resolve_client_secret, save_config_to,
};
use hcbridge_core::HaId;
use pretty_assertions::assert_eq;
use secrecy::ExposeSecret;

const PROFILE: &str = "hcbridge-config-test";

fn setup() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    (dir, path)
}

fn plaintext_profile() -> Profile {
    let mut profile = Profile::new("client-123");
    profile.client_secret = Some("plain-secret".into());
    profile
}

#[test]
fn missing_file_loads_defaults() {
    let (_dir, path) = setup();
    let config = load_config_from(&path).unwrap();

    assert_eq!(config.default_profile.as_deref(), Some("default"));
    assert_eq!(config.defaults.output, "table");
    assert_eq!(config.defaults.timeout, 30);
    assert!(config.profiles.is_empty());
}

#[test]
fn profile_fields_and_defaults_from_toml() {
    let (_dir, path) = setup();
    std::fs::write(
        &path,
        r#"
default_profile = "home"

[defaults]
output = "json"

[profiles.home]
client_id = "abc"
simulator = true
appliances = ["SIEMENS-HCS02DWH1-6BE58C26DCC1"]
grace_period = 10
"#,
    )
    .unwrap();

    let config = load_config_from(&path).unwrap();
    assert_eq!(config.profile_name(None), "home");
    assert_eq!(config.defaults.output, "json");
    assert_eq!(config.defaults.color, "auto");

    let home = config.profile("home").unwrap();
    assert_eq!(home.client_id, "abc");
    assert!(home.simulator);
    assert_eq!(home.scope, "IdentifyAppliance Monitor Control Settings");
    assert_eq!(home.redirect_uri, "http://localhost:8080/oauth/callback");
    assert_eq!(home.grace_period, Some(10));
    assert_eq!(home.retry_base, None);
}

#[test]
fn save_then_load_keeps_profiles() {
    let (_dir, path) = setup();
    let mut config = Config::default();
    let mut profile = plaintext_profile();
    profile.appliances = vec!["BOSCH-WAT28400-68A40E0B8F3B".into()];
    profile.timeout = Some(5);
    config.profiles.insert("default".into(), profile);

    save_config_to(&config, &path).unwrap();
    let loaded = load_config_from(&path).unwrap();

    let profile = loaded.profile("default").unwrap();
    assert_eq!(profile.client_id, "client-123");
    assert_eq!(profile.client_secret.as_deref(), Some("plain-secret"));
    assert_eq!(profile.appliances, vec!["BOSCH-WAT28400-68A40E0B8F3B"]);
    assert_eq!(profile.timeout, Some(5));
}

#[test]
fn save_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("config.toml");

    save_config_to(&Config::default(), &path).unwrap();
    assert!(path.exists());
}

#[test]
fn malformed_toml_is_a_figment_error() {
    let (_dir, path) = setup();
    std::fs::write(&path, "profiles = [not toml").unwrap();

    let err = load_config_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Figment(_)));
}

#[test]
fn plaintext_secret_is_last_resort() {
    let profile = plaintext_profile();
    let secret = resolve_client_secret(&profile, PROFILE).unwrap();
    assert_eq!(secret.expose_secret(), "plain-secret");
}

#[test]
fn env_secret_wins_over_plaintext() {
    let mut profile = plaintext_profile();
    // PATH is always present, so the test needs no env mutation.
    profile.client_secret_env = Some("PATH".into());

    let secret = resolve_client_secret(&profile, PROFILE).unwrap();
    assert_eq!(secret.expose_secret(), std::env::var("PATH").unwrap());
}

#[test]
fn unset_env_var_falls_through() {
    let mut profile = plaintext_profile();
    profile.client_secret_env = Some("HCBRIDGE_TEST_SECRET_THAT_IS_NEVER_SET".into());

    let secret = resolve_client_secret(&profile, PROFILE).unwrap();
    assert_eq!(secret.expose_secret(), "plain-secret");
}

#[test]
fn no_secret_anywhere_is_no_credentials() {
    let profile = Profile::new("client-123");
    let err = resolve_client_secret(&profile, PROFILE).unwrap_err();
    assert!(matches!(err, ConfigError::NoCredentials { ref profile } if profile == PROFILE));
}

#[test]
fn bridge_config_from_profile() {
    let mut profile = plaintext_profile();
    profile.simulator = true;
    profile.timeout = Some(7);
    profile.retry_base = Some(5);
    profile.retry_max = Some(60);
    profile.idle_timeout = Some(180);
    profile.refresh_margin = Some(120);
    profile.appliances = vec!["SIEMENS-HCS02DWH1-6BE58C26DCC1".into()];

    let config = profile_to_bridge_config(&profile, PROFILE).unwrap();

    assert_eq!(config.api_url.as_str(), "https://simulator.home-connect.com/");
    assert_eq!(config.oauth.base_url, config.api_url);
    assert_eq!(config.oauth.client_id, "client-123");
    assert_eq!(config.transport.timeout, Duration::from_secs(7));
    assert_eq!(config.stream.base_retry, Duration::from_secs(5));
    assert_eq!(config.stream.max_retry, Duration::from_secs(60));
    assert_eq!(config.stream.grace_period, Duration::from_secs(30));
    assert_eq!(config.stream.idle_timeout, Duration::from_secs(180));
    assert_eq!(config.refresh_margin, Duration::from_secs(120));
    assert!(config.is_selected(&HaId::from("SIEMENS-HCS02DWH1-6BE58C26DCC1")));
    assert!(!config.is_selected(&HaId::from("BOSCH-WAT28400-68A40E0B8F3B")));
}

#[test]
fn retry_base_above_max_is_rejected() {
    let mut profile = plaintext_profile();
    profile.retry_base = Some(600);
    profile.retry_max = Some(60);

    let err = profile_to_bridge_config(&profile, PROFILE).unwrap_err();
    assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "retry_base"));
}

#[test]
fn empty_client_id_is_rejected() {
    let mut profile = plaintext_profile();
    profile.client_id = "  ".into();

    let err = profile_to_bridge_config(&profile, PROFILE).unwrap_err();
    assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "client_id"));
}
