//! Per-appliance server-sent event stream with auto-reconnect.
//!
//! Opens `GET /api/homeappliances/{haId}/events` with
//! `Accept: text/event-stream` and publishes every `data:` line through a
//! [`tokio::sync::broadcast`] channel. Handles reconnection with a
//! doubling backoff, and absorbs brief STOP/START flaps with a grace
//! period before treating a STOP as a real disconnection.
//!
//! # Example
//!
//! ```rust,ignore
//! use hcbridge_api::stream::{EventStreamClient, StreamConfig};
//!
//! let stream = EventStreamClient::new(&api_url, "BOSCH-HCS06COM1-D70390681C2C", tokens, &transport, StreamConfig::default())?;
//! let mut rx = stream.subscribe();
//! stream.connect().await;
//!
//! while let Ok(payload) = rx.recv().await {
//!     println!("{payload}");
//! }
//!
//! stream.disconnect().await;
//! ```

mod backoff;
mod frame;

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use secrecy::ExposeSecret;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::auth::TokenStore;
use crate::error::Error;
use crate::transport::TransportConfig;

pub use backoff::{Backoff, StopGrace};
pub use frame::{ControlSignal, FrameDecoder, StreamFrame};

// ── Broadcast channel capacity ───────────────────────────────────────

const PAYLOAD_CHANNEL_CAPACITY: usize = 256;

// ── StreamConfig ─────────────────────────────────────────────────────

/// Reconnect and grace timing for an event stream.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// First reconnect delay, and the value restored after a successful connect. Default: 15s.
    pub base_retry: Duration,
    /// Ceiling for the doubling reconnect delay. Default: 900s.
    pub max_retry: Duration,
    /// How long a STOP may stay uncontradicted before it counts as a drop. Default: 30s.
    pub grace_period: Duration,
    /// Longest silence tolerated on an open stream. The vendor sends a
    /// keep-alive roughly every 55s, so a quiet connection is treated as dead. Default: 120s.
    pub idle_timeout: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            base_retry: Duration::from_secs(15),
            max_retry: Duration::from_secs(900),
            grace_period: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(120),
        }
    }
}

// ── StreamStatus ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// Why a single connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamEnd {
    Cancelled,
    /// Server closed the response body.
    Closed,
    /// STOP with no START inside the grace period.
    Stopped,
    /// Nothing received for `idle_timeout`.
    Idle,
}

// ── EventStreamClient ────────────────────────────────────────────────

/// Handle to one appliance's event stream.
///
/// Cheaply cloneable. At most one connection task runs per client;
/// `connect` tears down the previous one before starting another.
#[derive(Clone)]
pub struct EventStreamClient {
    inner: Arc<StreamInner>,
}

struct StreamInner {
    ha_id: String,
    url: Url,
    http: reqwest::Client,
    tokens: Arc<TokenStore>,
    config: StreamConfig,
    status: watch::Sender<StreamStatus>,
    retry_interval: watch::Sender<Duration>,
    payload_tx: broadcast::Sender<Arc<str>>,
    worker: Mutex<Option<Worker>>,
}

struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl EventStreamClient {
    /// Build a client for `{api_url}/api/homeappliances/{ha_id}/events`.
    pub fn new(
        api_url: &Url,
        ha_id: &str,
        tokens: Arc<TokenStore>,
        transport: &TransportConfig,
        config: StreamConfig,
    ) -> Result<Self, Error> {
        let base = api_url.as_str().trim_end_matches('/');
        let url = Url::parse(&format!("{base}/api/homeappliances/{ha_id}/events"))?;
        let http = transport.build_stream_client()?;
        Ok(Self::with_client(http, url, ha_id, tokens, config))
    }

    /// Wrap an existing `reqwest::Client` and a full events URL.
    pub fn with_client(
        http: reqwest::Client,
        url: Url,
        ha_id: &str,
        tokens: Arc<TokenStore>,
        config: StreamConfig,
    ) -> Self {
        let (status, _) = watch::channel(StreamStatus::Disconnected);
        let (retry_interval, _) = watch::channel(config.base_retry);
        let (payload_tx, _) = broadcast::channel(PAYLOAD_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(StreamInner {
                ha_id: ha_id.to_owned(),
                url,
                http,
                tokens,
                config,
                status,
                retry_interval,
                payload_tx,
                worker: Mutex::new(None),
            }),
        }
    }

    pub fn ha_id(&self) -> &str {
        &self.inner.ha_id
    }

    /// Receive every `data:` line, prefix included.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<str>> {
        self.inner.payload_tx.subscribe()
    }

    pub fn status(&self) -> StreamStatus {
        *self.inner.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<StreamStatus> {
        self.inner.status.subscribe()
    }

    /// Delay of the pending reconnect wait, or of the first one after a
    /// drop while connected. Back to the base value on every successful connect.
    pub fn retry_interval(&self) -> Duration {
        *self.inner.retry_interval.borrow()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start the connection task, closing any previous one first.
    pub async fn connect(&self) {
        let mut worker = self.inner.worker.lock().await;
        if let Some(previous) = worker.take() {
            debug!(ha_id = %self.inner.ha_id, "closing previous event stream");
            previous.stop().await;
        }

        self.inner.status.send_replace(StreamStatus::Connecting);
        let cancel = CancellationToken::new();
        let task_inner = Arc::clone(&self.inner);
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            stream_loop(task_inner, task_cancel).await;
        });
        *worker = Some(Worker { cancel, handle });
    }

    /// Reconnect, or do nothing if `skip_if_connected` and already connected.
    pub async fn reconnect(&self, skip_if_connected: bool) {
        if skip_if_connected && self.status() == StreamStatus::Connected {
            debug!(ha_id = %self.inner.ha_id, "already connected, skipping reconnect");
            return;
        }
        self.connect().await;
    }

    /// Close the stream and cancel any pending reconnect. Safe to call repeatedly.
    pub async fn disconnect(&self) {
        let mut worker = self.inner.worker.lock().await;
        if let Some(previous) = worker.take() {
            previous.stop().await;
            info!(ha_id = %self.inner.ha_id, "event stream closed");
        }
        self.inner.status.send_replace(StreamStatus::Disconnected);
    }
}

impl Worker {
    async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            warn!(error = %e, "event stream task ended abnormally");
        }
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on drop, wait the backoff → reconnect.
async fn stream_loop(inner: Arc<StreamInner>, cancel: CancellationToken) {
    let mut backoff = Backoff::new(inner.config.base_retry, inner.config.max_retry);

    loop {
        inner.status.send_replace(StreamStatus::Connecting);

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&inner, &cancel, &mut backoff) => result,
        };

        match outcome {
            Ok(StreamEnd::Cancelled) => break,
            Ok(end) => info!(ha_id = %inner.ha_id, reason = ?end, "event stream disconnected"),
            Err(e) => warn!(ha_id = %inner.ha_id, error = %e, "event stream failed"),
        }
        let delay = backoff.next_delay();
        inner.retry_interval.send_replace(delay);
        inner.status.send_replace(StreamStatus::Disconnected);
        info!(
            ha_id = %inner.ha_id,
            delay_secs = delay.as_secs(),
            "scheduling event stream reconnect"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    inner.status.send_replace(StreamStatus::Disconnected);
    debug!(ha_id = %inner.ha_id, "event stream loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Open one streaming request and read it until it ends.
async fn connect_and_read(
    inner: &StreamInner,
    cancel: &CancellationToken,
    backoff: &mut Backoff,
) -> Result<StreamEnd, Error> {
    let token = inner.tokens.get_valid_token().await?;
    debug!(ha_id = %inner.ha_id, url = %inner.url, "opening event stream");

    let resp = inner
        .http
        .get(inner.url.clone())
        .header(ACCEPT, "text/event-stream")
        .bearer_auth(token.expose_secret())
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(Error::Stream(format!("HTTP {status}")));
    }

    backoff.reset();
    inner.retry_interval.send_replace(backoff.current());
    info!(ha_id = %inner.ha_id, "event stream connected");
    inner.status.send_replace(StreamStatus::Connected);

    let mut body = resp.bytes_stream();
    let mut decoder = FrameDecoder::new();
    let mut grace = StopGrace::new(inner.config.grace_period);
    let mut last_activity = Instant::now();

    loop {
        let idle_deadline = last_activity + inner.config.idle_timeout;
        let deadline = grace.deadline();
        let grace_expired = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(StreamEnd::Cancelled),
            () = grace_expired => {
                info!(ha_id = %inner.ha_id, "STOP not followed by START within grace period");
                return Ok(StreamEnd::Stopped);
            }
            () = tokio::time::sleep_until(idle_deadline) => {
                warn!(
                    ha_id = %inner.ha_id,
                    idle_secs = inner.config.idle_timeout.as_secs(),
                    "event stream went silent"
                );
                return Ok(StreamEnd::Idle);
            }
            chunk = body.next() => match chunk {
                Some(Ok(bytes)) => {
                    last_activity = Instant::now();
                    for frame in decoder.push(&bytes) {
                        handle_frame(inner, &mut grace, frame);
                    }
                }
                Some(Err(e)) => return Err(Error::Stream(e.to_string())),
                None => return Ok(StreamEnd::Closed),
            },
        }
    }
}

fn handle_frame(inner: &StreamInner, grace: &mut StopGrace, frame: StreamFrame) {
    match frame {
        StreamFrame::Data(line) => {
            // Err only means no subscribers yet.
            let _ = inner.payload_tx.send(Arc::from(line));
        }
        StreamFrame::Control(ControlSignal::Stop) => {
            debug!(ha_id = %inner.ha_id, "STOP received, starting grace period");
            grace.stop(Instant::now());
        }
        StreamFrame::Control(ControlSignal::Start) => {
            if grace.start() {
                debug!(ha_id = %inner.ha_id, "START within grace period, STOP cancelled");
            }
        }
        StreamFrame::KeepAlive => trace!(ha_id = %inner.ha_id, "keep-alive"),
    }
}
