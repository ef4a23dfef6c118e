// Appliance REST client
//
// Thin typed facade over `/api/homeappliances`. Each call pulls a live
// bearer token from the shared `TokenStore`, so a refresh triggered here
// is shared with every other appliance worker.

use std::sync::Arc;

use reqwest::header::{ACCEPT, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use crate::auth::TokenStore;
use crate::error::Error;
use crate::models::{
    ApiErrorBody, ApplianceList, Envelope, HomeAppliance, KeyValue, PowerState, Program,
    ProgramDefinition, ProgramList, SettingList, StatusList,
};
use crate::transport::TransportConfig;

/// Vendor media type for request and response bodies.
pub const MEDIA_TYPE: &str = "application/vnd.bsh.sdk.v1+json";

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Typed REST client for the appliance API.
pub struct ApplianceClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<TokenStore>,
}

impl ApplianceClient {
    /// Create a client with its own `reqwest::Client` built from `transport`.
    ///
    /// `base_url` is the API root, e.g. `https://api.home-connect.com`.
    pub fn new(
        base_url: Url,
        tokens: Arc<TokenStore>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, tokens))
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, tokens: Arc<TokenStore>) -> Self {
        Self {
            http,
            base_url,
            tokens,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    // ── Appliances ───────────────────────────────────────────────────

    /// All appliances paired with the account.
    pub async fn list_appliances(&self) -> Result<Vec<HomeAppliance>, Error> {
        let list: ApplianceList = self.get("").await?;
        Ok(list.homeappliances)
    }

    pub async fn get_appliance(&self, ha_id: &str) -> Result<HomeAppliance, Error> {
        self.get(&format!("/{ha_id}")).await
    }

    // ── Status & settings ────────────────────────────────────────────

    pub async fn get_status(&self, ha_id: &str) -> Result<Vec<KeyValue>, Error> {
        let list: StatusList = self.get(&format!("/{ha_id}/status")).await?;
        Ok(list.status)
    }

    pub async fn get_settings(&self, ha_id: &str) -> Result<Vec<KeyValue>, Error> {
        let list: SettingList = self.get(&format!("/{ha_id}/settings")).await?;
        Ok(list.settings)
    }

    pub async fn get_setting(&self, ha_id: &str, key: &str) -> Result<KeyValue, Error> {
        self.get(&format!("/{ha_id}/settings/{key}")).await
    }

    pub async fn set_setting(
        &self,
        ha_id: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), Error> {
        let body = json!({ "data": { "key": key, "value": value } });
        self.put(&format!("/{ha_id}/settings/{key}"), &body).await
    }

    pub async fn set_power_state(&self, ha_id: &str, state: PowerState) -> Result<(), Error> {
        self.set_setting(
            ha_id,
            PowerState::SETTING_KEY,
            json!(state.vendor_value()),
        )
        .await
    }

    // ── Programs ─────────────────────────────────────────────────────

    pub async fn available_programs(&self, ha_id: &str) -> Result<Vec<ProgramDefinition>, Error> {
        let list: ProgramList = self.get(&format!("/{ha_id}/programs/available")).await?;
        Ok(list.programs)
    }

    /// The running program, or `None` if the appliance is idle.
    pub async fn active_program(&self, ha_id: &str) -> Result<Option<Program>, Error> {
        match self.get(&format!("/{ha_id}/programs/active")).await {
            Ok(program) => Ok(Some(program)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The selected (not yet started) program, or `None`.
    pub async fn selected_program(&self, ha_id: &str) -> Result<Option<Program>, Error> {
        match self.get(&format!("/{ha_id}/programs/selected")).await {
            Ok(program) => Ok(Some(program)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn select_program(&self, ha_id: &str, program_key: &str) -> Result<(), Error> {
        let body = json!({ "data": { "key": program_key } });
        self.put(&format!("/{ha_id}/programs/selected"), &body).await
    }

    pub async fn start_program(
        &self,
        ha_id: &str,
        program_key: &str,
        options: &[KeyValue],
    ) -> Result<(), Error> {
        let body = Envelope {
            data: Program {
                key: program_key.to_owned(),
                options: options.to_vec(),
            },
        };
        self.put(&format!("/{ha_id}/programs/active"), &body).await
    }

    pub async fn stop_program(&self, ha_id: &str) -> Result<(), Error> {
        self.delete(&format!("/{ha_id}/programs/active")).await
    }

    /// Change one option of the running program.
    pub async fn set_active_option(
        &self,
        ha_id: &str,
        option_key: &str,
        value: serde_json::Value,
    ) -> Result<(), Error> {
        let body = json!({ "data": { "key": option_key, "value": value } });
        self.put(&format!("/{ha_id}/programs/active/options/{option_key}"), &body)
            .await
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// `{base}/api/homeappliances{path}`
    fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/homeappliances{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let resp = self.send(Method::GET, path, None::<&()>).await?;
        let body = resp.text().await?;
        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body,
            })?;
        Ok(envelope.data)
    }

    async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), Error> {
        self.send(Method::PUT, path, Some(body)).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        self.send(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, Error> {
        let url = self.url(path)?;
        let token = self.tokens.get_valid_token().await?;
        debug!("{method} {url}");

        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(token.expose_secret())
            .header(ACCEPT, MEDIA_TYPE);
        if let Some(body) = body {
            let payload = serde_json::to_vec(body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: String::new(),
            })?;
            request = request.header(CONTENT_TYPE, MEDIA_TYPE).body(payload);
        }

        let resp = request.send().await?;
        self.check_status(resp).await
    }

    /// Map non-success responses into typed errors.
    async fn check_status(&self, resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(Error::RateLimited { retry_after_secs });
        }

        let body = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ApiErrorBody>(&body).ok();

        if status == StatusCode::UNAUTHORIZED {
            warn!("API rejected the bearer token");
            self.tokens.invalidate();
            return Err(Error::Authentication {
                message: detail.map_or_else(
                    || format!("HTTP {status}"),
                    |d| d.error.description.unwrap_or(d.error.key),
                ),
            });
        }

        Err(match detail {
            Some(d) => Error::Api {
                status: status.as_u16(),
                message: d.error.description.unwrap_or_else(|| d.error.key.clone()),
                key: Some(d.error.key),
            },
            None => Error::Api {
                status: status.as_u16(),
                key: None,
                message: if body.is_empty() {
                    status.to_string()
                } else {
                    body
                },
            },
        })
    }
}
