#![allow(clippy::unwrap_used)]
// Integration tests for `EventStreamClient`: wiremock for plain
// request/response cases, a raw TCP listener where the test needs to
// hold the stream open and write control lines on its own schedule.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hcbridge_api::auth::now_ms;
use hcbridge_api::{
    EventStreamClient, OAuthClient, OAuthConfig, StreamConfig, StreamStatus, Token, TokenStore,
    TransportConfig,
};

const HA_ID: &str = "SIEMENS-HB676G5S6-68A40E251CB1";
const WAIT: Duration = Duration::from_secs(3);

// ── Helpers ─────────────────────────────────────────────────────────

fn tokens(base_url: &Url) -> Arc<TokenStore> {
    let oauth = OAuthClient::with_client(
        reqwest::Client::new(),
        OAuthConfig {
            base_url: base_url.clone(),
            client_id: "client-id".into(),
            client_secret: SecretString::from("client-secret".to_string()),
            redirect_uri: "https://hub.local/oauth/callback".into(),
            scope: "IdentifyAppliance Monitor".into(),
        },
    );
    let store = Arc::new(TokenStore::new(oauth));
    store.load(Token::new(
        "stream-access".into(),
        "stream-refresh".into(),
        now_ms() + 3_600_000,
    ));
    store
}

fn fast_config(base_retry_ms: u64) -> StreamConfig {
    StreamConfig {
        base_retry: Duration::from_millis(base_retry_ms),
        max_retry: Duration::from_millis(base_retry_ms * 4),
        ..StreamConfig::default()
    }
}

fn stream_for(base: &str, config: StreamConfig) -> EventStreamClient {
    let base_url = Url::parse(base).unwrap();
    EventStreamClient::new(
        &base_url,
        HA_ID,
        tokens(&base_url),
        &TransportConfig::default(),
        config,
    )
    .unwrap()
}

async fn wait_for_status(client: &EventStreamClient, want: StreamStatus) {
    timeout(WAIT, status_becomes(client, want))
        .await
        .unwrap_or_else(|_| panic!("status never became {want:?}"));
}

/// Untimed wait for paused-clock tests, where a `timeout` would be
/// auto-advanced past before the socket has a chance to deliver.
async fn status_becomes(client: &EventStreamClient, want: StreamStatus) {
    client.watch_status().wait_for(|s| *s == want).await.unwrap();
}

/// Accept connections in the background and hand each socket to the test.
async fn raw_server() -> (String, mpsc::Receiver<TcpStream>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel(4);
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            if tx.send(socket).await.is_err() {
                break;
            }
        }
    });
    (format!("http://{addr}"), rx)
}

/// Take the next connection and read its request head.
async fn next_request(rx: &mut mpsc::Receiver<TcpStream>) -> (TcpStream, String) {
    let mut socket = rx.recv().await.unwrap();
    let mut head = Vec::new();
    let mut buf = [0_u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut buf).await.unwrap();
        assert!(n > 0, "client closed before sending a request");
        head.extend_from_slice(&buf[..n]);
    }
    (socket, String::from_utf8_lossy(&head).to_ascii_lowercase())
}

/// Answer with an open-ended event-stream response.
async fn open_stream(socket: &mut TcpStream) {
    socket
        .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
}

async fn refuse(socket: &mut TcpStream) {
    socket
        .write_all(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
}

async fn accept_stream(rx: &mut mpsc::Receiver<TcpStream>) -> (TcpStream, String) {
    let (mut socket, head) = timeout(WAIT, next_request(rx)).await.unwrap();
    open_stream(&mut socket).await;
    (socket, head)
}

/// Paused-clock counterpart of `accept_stream`.
async fn accept_stream_untimed(rx: &mut mpsc::Receiver<TcpStream>) -> TcpStream {
    let (mut socket, _) = next_request(rx).await;
    open_stream(&mut socket).await;
    socket
}

// ── Payload delivery ────────────────────────────────────────────────

#[tokio::test]
async fn test_data_lines_are_broadcast_and_stream_reconnects_after_eof() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/api/homeappliances/{HA_ID}/events")))
        .and(header("accept", "text/event-stream"))
        .and(header("authorization", "Bearer stream-access"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(concat!(
                    "event: STATUS\n",
                    "data: {\"items\":[{\"key\":\"BSH.Common.Status.DoorState\",\"value\":\"BSH.Common.EnumType.DoorState.Open\"}]}\n",
                    "id: SIEMENS-HB676G5S6-68A40E251CB1\n",
                    "\n",
                    ": keep-alive\n",
                )),
        )
        .mount(&server)
        .await;

    let client = stream_for(&server.uri(), fast_config(50));
    let mut rx = client.subscribe();
    client.connect().await;

    let first = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert!(first.starts_with("data: {\"items\""));
    assert!(first.contains("DoorState.Open"));

    // The body ends after one event; the client must come back on its own.
    let second = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(first, second);
    assert!(server.received_requests().await.unwrap().len() >= 2);

    client.disconnect().await;
    assert_eq!(client.status(), StreamStatus::Disconnected);
}

// ── Failure & backoff ───────────────────────────────────────────────

#[tokio::test]
async fn test_rejected_stream_backs_off_without_invalidating_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/api/homeappliances/{HA_ID}/events")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let base_url = Url::parse(&server.uri()).unwrap();
    let store = tokens(&base_url);
    let client = EventStreamClient::new(
        &base_url,
        HA_ID,
        Arc::clone(&store),
        &TransportConfig::default(),
        fast_config(50),
    )
    .unwrap();
    client.connect().await;

    timeout(WAIT, async {
        while server.received_requests().await.unwrap().len() < 2 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();

    assert_ne!(client.status(), StreamStatus::Connected);
    timeout(WAIT, async {
        while client.retry_interval() <= Duration::from_millis(50) {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();
    assert!(store.is_authorized());

    client.disconnect().await;
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let client = stream_for("http://127.0.0.1:9", fast_config(50));
    client.disconnect().await;
    client.connect().await;
    client.disconnect().await;
    client.disconnect().await;
    assert_eq!(client.status(), StreamStatus::Disconnected);
}

// ── STOP / START grace period ───────────────────────────────────────
//
// These run on tokio's paused clock with the production timings: the
// runtime jumps straight to the next timer whenever every task is idle.

const EMPTY_ITEMS: &[u8] = b"data: {\"items\":[]}\n";

#[tokio::test(start_paused = true)]
async fn test_start_within_grace_keeps_connection() {
    let (base, mut sockets) = raw_server().await;
    let client = stream_for(&base, StreamConfig::default());
    let mut rx = client.subscribe();
    client.connect().await;

    let (mut socket, request) = next_request(&mut sockets).await;
    assert!(request.starts_with(&format!("get /api/homeappliances/{}/events", HA_ID.to_ascii_lowercase())));
    assert!(request.contains("accept: text/event-stream"));
    open_stream(&mut socket).await;
    status_becomes(&client, StreamStatus::Connected).await;

    // A payload behind each control line proves the line was consumed.
    socket.write_all(b"STOP\n").await.unwrap();
    socket.write_all(EMPTY_ITEMS).await.unwrap();
    rx.recv().await.unwrap();

    tokio::time::sleep(Duration::from_secs(10)).await;
    socket.write_all(b"START\n").await.unwrap();
    socket.write_all(EMPTY_ITEMS).await.unwrap();
    let payload = rx.recv().await.unwrap();
    assert_eq!(&*payload, "data: {\"items\":[]}");

    // Well past the 30s grace period.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(client.status(), StreamStatus::Connected);

    client.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_drop_backs_off_doubles_and_resets_on_connect() {
    let (base, mut sockets) = raw_server().await;
    let client = stream_for(&base, StreamConfig::default());
    client.connect().await;

    let mut socket = accept_stream_untimed(&mut sockets).await;
    status_becomes(&client, StreamStatus::Connected).await;
    assert_eq!(client.retry_interval(), Duration::from_secs(15));

    let stopped_at = Instant::now();
    socket.write_all(b"STOP\n").await.unwrap();
    status_becomes(&client, StreamStatus::Disconnected).await;
    assert!(stopped_at.elapsed() >= Duration::from_secs(30));
    assert_eq!(client.retry_interval(), Duration::from_secs(15));

    // First retry waits the base interval and is refused.
    let dropped_at = Instant::now();
    let (mut second, request) = next_request(&mut sockets).await;
    assert!(dropped_at.elapsed() >= Duration::from_secs(15));
    assert!(request.contains("authorization: bearer stream-access"));
    refuse(&mut second).await;
    status_becomes(&client, StreamStatus::Disconnected).await;
    assert_eq!(client.retry_interval(), Duration::from_secs(30));

    // Second retry waits twice as long, connects, and the interval resets.
    let refused_at = Instant::now();
    let _third = accept_stream_untimed(&mut sockets).await;
    assert!(refused_at.elapsed() >= Duration::from_secs(30));
    status_becomes(&client, StreamStatus::Connected).await;
    assert_eq!(client.retry_interval(), Duration::from_secs(15));

    client.disconnect().await;
    assert_eq!(client.status(), StreamStatus::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_keep_alive_holds_connection_open() {
    let (base, mut sockets) = raw_server().await;
    let client = stream_for(&base, StreamConfig::default());
    client.connect().await;

    let mut socket = accept_stream_untimed(&mut sockets).await;
    status_becomes(&client, StreamStatus::Connected).await;

    // 165s in total: beyond both the grace period and the idle timeout.
    for _ in 0..3 {
        socket.write_all(b"event: KEEP-ALIVE\n\n").await.unwrap();
        tokio::time::sleep(Duration::from_secs(55)).await;
        assert_eq!(client.status(), StreamStatus::Connected);
    }

    client.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn test_silent_stream_reconnects_after_idle_timeout() {
    let (base, mut sockets) = raw_server().await;
    let client = stream_for(&base, StreamConfig::default());
    client.connect().await;

    let opened_at = Instant::now();
    let _silent = accept_stream_untimed(&mut sockets).await;
    status_becomes(&client, StreamStatus::Connected).await;

    status_becomes(&client, StreamStatus::Disconnected).await;
    assert!(opened_at.elapsed() >= Duration::from_secs(120));

    let _fresh = accept_stream_untimed(&mut sockets).await;
    status_becomes(&client, StreamStatus::Connected).await;

    client.disconnect().await;
}

#[tokio::test]
async fn test_reconnect_skips_when_connected() {
    let (base, mut sockets) = raw_server().await;
    let client = stream_for(&base, fast_config(1_000));
    client.connect().await;

    let (_socket, _) = accept_stream(&mut sockets).await;
    wait_for_status(&client, StreamStatus::Connected).await;

    client.reconnect(true).await;
    assert_eq!(client.status(), StreamStatus::Connected);
    assert!(
        timeout(Duration::from_millis(300), sockets.recv())
            .await
            .is_err(),
        "no second connection expected"
    );

    client.reconnect(false).await;
    let (_socket2, _) = accept_stream(&mut sockets).await;
    wait_for_status(&client, StreamStatus::Connected).await;

    client.disconnect().await;
}
