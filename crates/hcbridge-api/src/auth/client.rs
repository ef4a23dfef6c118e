// OAuth2 authorization-code client for the appliance cloud.
//
// Builds the authorization redirect, validates the callback, and performs
// the two token-endpoint exchanges (authorization_code, refresh_token)
// over one shared transport and error mapping.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::state;
use super::token::{Token, now_ms};
use crate::error::Error;
use crate::transport::TransportConfig;

const AUTHORIZE_PATH: &str = "security/oauth/authorize";
const TOKEN_PATH: &str = "security/oauth/token";

/// Registered application credentials and endpoints.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// API root, e.g. `https://api.home-connect.com`.
    pub base_url: Url,
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_uri: String,
    /// Space-separated scopes, e.g. `IdentifyAppliance Monitor Control Settings`.
    pub scope: String,
}

/// Successful token-endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

/// RFC 6749 error body.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// OAuth2 client for the authorization-code grant.
pub struct OAuthClient {
    http: reqwest::Client,
    config: OAuthConfig,
}

impl OAuthClient {
    /// Create a client with its own `reqwest::Client` built from `transport`.
    pub fn new(config: OAuthConfig, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, config })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, config: OAuthConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    // ── Authorization redirect ───────────────────────────────────────

    /// Sign a fresh `state` value for an authorization redirect.
    pub fn new_state(&self, now_ms: i64) -> Result<String, Error> {
        state::generate_state(&self.config.client_id, &self.config.client_secret, now_ms)
    }

    /// Verify a `state` value returned on the callback.
    pub fn verify_state(&self, state: &str, now_ms: i64) -> Result<(), Error> {
        state::verify_state(
            state,
            &self.config.client_id,
            &self.config.client_secret,
            now_ms,
        )
    }

    /// The URL the operator opens to grant access.
    pub fn authorization_url(&self, state: &str) -> Result<Url, Error> {
        let mut url = self.endpoint(AUTHORIZE_PATH)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scope)
            .append_pair("state", state);
        Ok(url)
    }

    /// Handle the redirect back from the vendor.
    ///
    /// Accepts either the full redirect URL or just its query string.
    /// The `state` is verified before the `code` is exchanged.
    pub async fn handle_callback(&self, callback: &str, now_ms: i64) -> Result<Token, Error> {
        let params = CallbackParams::parse(callback)?;

        if let Some(error) = params.error {
            return Err(Error::Authentication {
                message: format!("authorization denied: {error}"),
            });
        }

        let state = params.state.ok_or_else(|| Error::InvalidState {
            reason: "callback has no state".into(),
        })?;
        self.verify_state(&state, now_ms)?;

        let code = params.code.ok_or_else(|| Error::Authentication {
            message: "callback has no authorization code".into(),
        })?;
        self.exchange_code(&code).await
    }

    // ── Token endpoint ───────────────────────────────────────────────

    /// Exchange an authorization code for a token pair.
    pub async fn exchange_code(&self, code: &str) -> Result<Token, Error> {
        let response = self
            .token_request(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", &self.config.redirect_uri),
            ])
            .await?;

        let refresh_token = response.refresh_token.ok_or_else(|| Error::Authentication {
            message: "token response has no refresh_token".into(),
        })?;
        Ok(Token::new(
            response.access_token,
            refresh_token,
            expiry_from(response.expires_in),
        ))
    }

    /// Exchange the refresh token of `token` for a new token pair.
    ///
    /// If the endpoint does not rotate the refresh token, the previous one
    /// is carried over.
    pub async fn refresh(&self, token: &Token) -> Result<Token, Error> {
        let response = self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", token.refresh_token.expose_secret()),
            ])
            .await?;

        let refresh_token = response
            .refresh_token
            .unwrap_or_else(|| token.refresh_token.expose_secret().to_owned());
        Ok(Token::new(
            response.access_token,
            refresh_token,
            expiry_from(response.expires_in),
        ))
    }

    /// POST a form to the token endpoint and decode the response.
    async fn token_request(&self, grant: &[(&str, &str)]) -> Result<TokenResponse, Error> {
        let url = self.endpoint(TOKEN_PATH)?;
        debug!(grant_type = grant.first().map_or("", |(_, v)| *v), "POST {url}");

        let mut form: Vec<(&str, &str)> = vec![
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
        ];
        form.extend_from_slice(grant);

        let resp = self.http.post(url).form(&form).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(desc) => format!("{} ({desc})", err.error),
                    None => err.error,
                },
                Err(_) => format!("token endpoint returned HTTP {status}"),
            };
            return Err(Error::Authentication { message });
        }

        serde_json::from_str(&body).map_err(|e| Error::Authentication {
            message: format!("malformed token response: {e}"),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let base = self.config.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }
}

fn expiry_from(expires_in_secs: i64) -> i64 {
    now_ms().saturating_add(expires_in_secs.saturating_mul(1000))
}

// ── Callback parsing ─────────────────────────────────────────────────

#[derive(Debug, Default)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

impl CallbackParams {
    fn parse(callback: &str) -> Result<Self, Error> {
        let callback = callback.trim();
        let query = if callback.contains("://") {
            Url::parse(callback)?.query().unwrap_or_default().to_owned()
        } else {
            callback
                .split_once('?')
                .map_or(callback, |(_, q)| q)
                .to_owned()
        };

        let mut params = Self::default();
        let mut description = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "state" => params.state = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                "error_description" => description = Some(value.into_owned()),
                _ => {}
            }
        }
        if let (Some(error), Some(desc)) = (params.error.as_mut(), description) {
            error.push_str(&format!(": {desc}"));
        }
        Ok(params)
    }
}
