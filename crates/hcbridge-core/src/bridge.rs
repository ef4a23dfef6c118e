// ── Bridge lifecycle ──
//
// Owns the shared token store, the REST client and the router. Each
// added appliance gets an attribute state registered in the router, an
// event stream, and a forwarding task that feeds stream payloads through
// the normalizer into the router.

use std::sync::Arc;

use dashmap::DashMap;
use hcbridge_api::models::Program;
use hcbridge_api::{
    ApplianceClient, EventStreamClient, OAuthClient, StreamStatus, TokenStore,
};
use serde_json::Value;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{Command, CommandResult};
use crate::config::BridgeConfig;
use crate::error::CoreError;
use crate::model::{Appliance, AttributeUpdate, HaId, NormalizedEvent};
use crate::normalize::{normalize, tables};
use crate::router::{ApplianceSink, RouteOutcome, Router};
use crate::state::{AttributeSnapshot, AttributeState};

const UPDATE_CHANNEL_SIZE: usize = 256;

/// An attribute write, tagged with its appliance.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplianceUpdate {
    pub ha_id: HaId,
    pub update: AttributeUpdate,
}

// ── Bridge ───────────────────────────────────────────────────────────

/// Entry point for hosts.
///
/// Cheaply cloneable via `Arc<BridgeInner>`.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    config: BridgeConfig,
    tokens: Arc<TokenStore>,
    client: ApplianceClient,
    router: Arc<Router>,
    appliances: DashMap<HaId, ManagedAppliance>,
    updates: broadcast::Sender<ApplianceUpdate>,
    /// Serializes add/remove so an appliance never has two streams.
    lifecycle: Mutex<()>,
}

struct ManagedAppliance {
    appliance: Appliance,
    state: Arc<AttributeState>,
    stream: EventStreamClient,
    cancel: CancellationToken,
    forwarder: JoinHandle<()>,
}

impl Bridge {
    /// Create a bridge with an empty token store.
    ///
    /// Load a persisted token through [`tokens()`](Self::tokens) or run
    /// the authorization flow before calling anything that hits the API.
    pub fn new(config: BridgeConfig) -> Result<Self, CoreError> {
        let oauth = OAuthClient::new(config.oauth.clone(), &config.transport)?;
        let tokens = Arc::new(TokenStore::with_margin(oauth, config.refresh_margin));
        Self::with_tokens(config, tokens)
    }

    /// Create a bridge sharing an existing token store.
    pub fn with_tokens(config: BridgeConfig, tokens: Arc<TokenStore>) -> Result<Self, CoreError> {
        let client = ApplianceClient::new(
            config.api_url.clone(),
            Arc::clone(&tokens),
            &config.transport,
        )?;
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(BridgeInner {
                config,
                tokens,
                client,
                router: Arc::new(Router::new()),
                appliances: DashMap::new(),
                updates,
                lifecycle: Mutex::new(()),
            }),
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.inner.tokens
    }

    /// The REST client, for reads the bridge does not wrap.
    pub fn client(&self) -> &ApplianceClient {
        &self.inner.client
    }

    // ── Discovery ────────────────────────────────────────────────────

    /// Paired appliances that pass the selection, with a known type.
    pub async fn discover(&self) -> Result<Vec<Appliance>, CoreError> {
        let paired = self.inner.client.list_appliances().await?;
        let mut found = Vec::with_capacity(paired.len());

        for ha in &paired {
            match Appliance::try_from(ha) {
                Ok(appliance) if self.inner.config.is_selected(&appliance.ha_id) => {
                    found.push(appliance);
                }
                Ok(appliance) => debug!(ha_id = %appliance.ha_id, "appliance not selected"),
                Err(e) => warn!(ha_id = %ha.ha_id, error = %e, "skipping appliance"),
            }
        }

        info!(paired = paired.len(), selected = found.len(), "discovered appliances");
        Ok(found)
    }

    /// Look up one paired appliance.
    pub async fn fetch_appliance(&self, ha_id: &HaId) -> Result<Appliance, CoreError> {
        match self.inner.client.get_appliance(ha_id.as_str()).await {
            Ok(ha) => Appliance::try_from(&ha),
            Err(e) if e.is_not_found() => Err(CoreError::ApplianceNotFound {
                ha_id: ha_id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    // ── Appliance lifecycle ──────────────────────────────────────────

    /// Start bridging `appliance`: register state, seed it from REST,
    /// then open its event stream.
    ///
    /// Adding an appliance that is already bridged replaces it, closing
    /// the previous stream first.
    pub async fn add_appliance(&self, appliance: Appliance) -> Result<(), CoreError> {
        let _guard = self.inner.lifecycle.lock().await;
        let ha_id = appliance.ha_id.clone();

        if let Some((_, previous)) = self.inner.appliances.remove(&ha_id) {
            debug!(%ha_id, "replacing bridged appliance");
            previous.shutdown().await;
        }

        let state = Arc::new(AttributeState::new(ha_id.clone()));
        self.inner.router.register(
            ha_id.clone(),
            appliance.kind,
            Arc::clone(&state) as Arc<dyn ApplianceSink>,
        );

        if let Err(e) = self.seed(&self.inner.router, &ha_id).await {
            self.inner.router.unregister(&ha_id);
            return Err(e);
        }

        let stream = match EventStreamClient::new(
            &self.inner.config.api_url,
            ha_id.as_str(),
            Arc::clone(&self.inner.tokens),
            &self.inner.config.transport,
            self.inner.config.stream.clone(),
        ) {
            Ok(stream) => stream,
            Err(e) => {
                self.inner.router.unregister(&ha_id);
                return Err(e.into());
            }
        };

        let cancel = CancellationToken::new();
        let forwarder = tokio::spawn(forward_events(
            ha_id.clone(),
            stream.subscribe(),
            Arc::clone(&self.inner.router),
            self.inner.updates.clone(),
            cancel.clone(),
        ));
        stream.connect().await;

        info!(%ha_id, kind = %appliance.kind, attributes = state.len(), "appliance bridged");
        self.inner.appliances.insert(
            ha_id,
            ManagedAppliance {
                appliance,
                state,
                stream,
                cancel,
                forwarder,
            },
        );
        Ok(())
    }

    /// Stop bridging `ha_id`: close its stream (cancelling any pending
    /// reconnect), stop its forwarder, and unregister it from the router.
    pub async fn remove_appliance(&self, ha_id: &HaId) -> Result<(), CoreError> {
        let _guard = self.inner.lifecycle.lock().await;
        let (_, managed) =
            self.inner
                .appliances
                .remove(ha_id)
                .ok_or_else(|| CoreError::ApplianceNotFound {
                    ha_id: ha_id.to_string(),
                })?;

        managed.shutdown().await;
        self.inner.router.unregister(ha_id);
        info!(%ha_id, "appliance removed");
        Ok(())
    }

    /// Remove every bridged appliance.
    pub async fn shutdown(&self) {
        let ids: Vec<HaId> = self
            .inner
            .appliances
            .iter()
            .map(|r| r.key().clone())
            .collect();
        for ha_id in ids {
            if let Err(e) = self.remove_appliance(&ha_id).await {
                debug!(%ha_id, error = %e, "appliance already removed");
            }
        }
    }

    /// Force a stream reconnect, skipping it if the stream is already up.
    pub async fn reconnect(&self, ha_id: &HaId) -> Result<(), CoreError> {
        let stream = self
            .inner
            .appliances
            .get(ha_id)
            .map(|m| m.stream.clone())
            .ok_or_else(|| CoreError::ApplianceNotFound {
                ha_id: ha_id.to_string(),
            })?;
        stream.reconnect(true).await;
        Ok(())
    }

    // ── Observation ──────────────────────────────────────────────────

    /// Currently bridged appliances.
    pub fn appliances(&self) -> Vec<Appliance> {
        let mut list: Vec<Appliance> = self
            .inner
            .appliances
            .iter()
            .map(|r| r.appliance.clone())
            .collect();
        list.sort_by(|a, b| a.ha_id.cmp(&b.ha_id));
        list
    }

    pub fn attributes(&self, ha_id: &HaId) -> Option<AttributeSnapshot> {
        self.inner.appliances.get(ha_id).map(|m| m.state.snapshot())
    }

    pub fn subscribe_attributes(&self, ha_id: &HaId) -> Option<watch::Receiver<AttributeSnapshot>> {
        self.inner.appliances.get(ha_id).map(|m| m.state.subscribe())
    }

    pub fn stream_status(&self, ha_id: &HaId) -> Option<watch::Receiver<StreamStatus>> {
        self.inner
            .appliances
            .get(ha_id)
            .map(|m| m.stream.watch_status())
    }

    /// Every attribute write applied from the event streams.
    pub fn subscribe_updates(&self) -> broadcast::Receiver<ApplianceUpdate> {
        self.inner.updates.subscribe()
    }

    /// One-shot attribute snapshot from REST, without opening a stream.
    pub async fn fetch_attributes(
        &self,
        appliance: &Appliance,
    ) -> Result<AttributeSnapshot, CoreError> {
        let router = Router::new();
        let state = Arc::new(AttributeState::new(appliance.ha_id.clone()));
        router.register(
            appliance.ha_id.clone(),
            appliance.kind,
            Arc::clone(&state) as Arc<dyn ApplianceSink>,
        );
        self.seed(&router, &appliance.ha_id).await?;
        Ok(state.snapshot())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Run a write operation against an appliance.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        let client = &self.inner.client;
        debug!(ha_id = %cmd.ha_id(), ?cmd, "executing command");

        match cmd {
            Command::StartProgram {
                ha_id,
                program,
                options,
            } => {
                client
                    .start_program(ha_id.as_str(), &program, &options)
                    .await?;
            }
            Command::StopProgram { ha_id } => client.stop_program(ha_id.as_str()).await?,
            Command::SelectProgram { ha_id, program } => {
                client.select_program(ha_id.as_str(), &program).await?;
            }
            Command::SetOption { ha_id, key, value } => {
                client.set_active_option(ha_id.as_str(), &key, value).await?;
            }
            Command::SetSetting { ha_id, key, value } => {
                client.set_setting(ha_id.as_str(), &key, value).await?;
            }
            Command::SetPower { ha_id, state } => {
                client.set_power_state(ha_id.as_str(), state).await?;
            }
        }
        Ok(CommandResult::Ok)
    }

    // ── Seeding ──────────────────────────────────────────────────────

    /// Route the REST status, settings and active program through the
    /// same path stream events take. Authorization failures abort;
    /// anything else (e.g. an offline appliance) is logged and skipped.
    async fn seed(&self, router: &Router, ha_id: &HaId) -> Result<usize, CoreError> {
        let client = &self.inner.client;
        let mut events: Vec<NormalizedEvent> = Vec::new();

        if let Some(status) = tolerate(ha_id, "status", client.get_status(ha_id.as_str()).await)? {
            events.extend(
                status
                    .into_iter()
                    .map(|kv| NormalizedEvent::from_key_value(ha_id.clone(), kv)),
            );
        }
        if let Some(settings) =
            tolerate(ha_id, "settings", client.get_settings(ha_id.as_str()).await)?
        {
            events.extend(
                settings
                    .into_iter()
                    .map(|kv| NormalizedEvent::from_key_value(ha_id.clone(), kv)),
            );
        }
        if let Some(Some(program)) = tolerate(
            ha_id,
            "active program",
            client.active_program(ha_id.as_str()).await,
        )? {
            events.extend(program_events(ha_id, program));
        }

        let applied = events
            .iter()
            .filter(|event| matches!(router.route(event), RouteOutcome::Applied(_)))
            .count();
        debug!(%ha_id, received = events.len(), applied, "seeded attribute state");
        Ok(applied)
    }
}

impl ManagedAppliance {
    async fn shutdown(self) {
        self.stream.disconnect().await;
        self.cancel.cancel();
        if let Err(e) = self.forwarder.await {
            warn!(ha_id = %self.appliance.ha_id, error = %e, "event forwarder ended abnormally");
        }
    }
}

/// Pass through auth failures; log and swallow the rest.
fn tolerate<T>(
    ha_id: &HaId,
    what: &str,
    result: Result<T, hcbridge_api::Error>,
) -> Result<Option<T>, CoreError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_auth_failure() => Err(e.into()),
        Err(e) => {
            warn!(%ha_id, error = %e, "could not read {what}");
            Ok(None)
        }
    }
}

fn program_events(ha_id: &HaId, program: Program) -> impl Iterator<Item = NormalizedEvent> + '_ {
    let root = NormalizedEvent::new(
        ha_id.clone(),
        tables::ACTIVE_PROGRAM,
        Value::String(program.key),
    );
    std::iter::once(root).chain(
        program
            .options
            .into_iter()
            .map(|kv| NormalizedEvent::from_key_value(ha_id.clone(), kv)),
    )
}

// ── Event forwarding ─────────────────────────────────────────────────

/// Stream payload → normalize → route, until cancelled or the stream is dropped.
async fn forward_events(
    ha_id: HaId,
    mut payloads: broadcast::Receiver<Arc<str>>,
    router: Arc<Router>,
    updates: broadcast::Sender<ApplianceUpdate>,
    cancel: CancellationToken,
) {
    loop {
        let received = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            received = payloads.recv() => received,
        };

        match received {
            Ok(chunk) => {
                for event in normalize(&ha_id, &chunk) {
                    if let RouteOutcome::Applied(update) = router.route(&event) {
                        // Err only means nobody is listening.
                        let _ = updates.send(ApplianceUpdate {
                            ha_id: ha_id.clone(),
                            update,
                        });
                    }
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(%ha_id, skipped, "event forwarder lagged behind the stream");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    debug!(%ha_id, "event forwarder exiting");
}
