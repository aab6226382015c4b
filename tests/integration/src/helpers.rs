//! Test helpers for integration tests
//!
//! [`TestServer`] serves `GET /api/v10/gateway/bot` and a scripted gateway
//! WebSocket on one local port. The gateway sends Hello, answers Identify
//! with READY plus one MESSAGE_CREATE, Resume with RESUMED, and heartbeats
//! with ACKs. Every frame the client sends is recorded.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chat_common::ClientConfig;
use chat_gateway::{GatewayEvent, GatewayMessage, OpCode};
use futures_util::{Sink, SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// How long a test waits for any single thing to happen
pub const WAIT: Duration = Duration::from_secs(5);

/// Token the mock API accepts
pub const TEST_TOKEN: &str = "integration-token";

/// Session id the mock gateway hands out in READY
pub const TEST_SESSION: &str = "integration-session";

struct ServerState {
    token: String,
    gateway_url: String,
    heartbeat_interval: u64,
    /// Close-code senders, one per accepted socket
    sockets: Mutex<Vec<mpsc::UnboundedSender<u16>>>,
    frames: mpsc::UnboundedSender<(usize, GatewayMessage)>,
}

/// Mock REST API plus gateway
pub struct TestServer {
    pub addr: SocketAddr,
    state: Arc<ServerState>,
    frames: mpsc::UnboundedReceiver<(usize, GatewayMessage)>,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server
    pub async fn start() -> Result<Self> {
        Self::start_with_interval(45_000).await
    }

    /// Start a test server announcing `heartbeat_interval` ms in Hello
    pub async fn start_with_interval(heartbeat_interval: u64) -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let (frames_tx, frames) = mpsc::unbounded_channel();
        let state = Arc::new(ServerState {
            token: TEST_TOKEN.to_string(),
            gateway_url: format!("ws://{addr}/gateway"),
            heartbeat_interval,
            sockets: Mutex::new(Vec::new()),
            frames: frames_tx,
        });

        let app = Router::new()
            .route("/api/v10/gateway/bot", get(gateway_bot))
            .route("/gateway", get(gateway_socket))
            .with_state(Arc::clone(&state));

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            state,
            frames,
            _handle: handle,
        })
    }

    /// REST base URL, without the version segment
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn gateway_url(&self) -> &str {
        &self.state.gateway_url
    }

    /// Number of gateway sockets accepted so far
    pub fn connections(&self) -> usize {
        self.state.sockets.lock().len()
    }

    /// Close the most recent socket with `code`
    pub fn disconnect(&self, code: u16) {
        if let Some(socket) = self.state.sockets.lock().last() {
            let _ = socket.send(code);
        }
    }

    /// Next frame received from the client, skipping heartbeats
    pub async fn next_frame(&mut self) -> Result<(usize, GatewayMessage)> {
        loop {
            let (socket, frame) = tokio::time::timeout(WAIT, self.frames.recv())
                .await
                .context("Timed out waiting for a client frame")?
                .context("Gateway server stopped")?;
            if frame.opcode() != Some(OpCode::Heartbeat) {
                return Ok((socket, frame));
            }
        }
    }

    /// Client configuration pointing at this server
    pub fn client_config(&self, token: &str) -> Result<ClientConfig> {
        let vars = HashMap::from([
            ("BOT_TOKEN".to_string(), token.to_string()),
            ("API_BASE_URL".to_string(), self.api_url()),
            ("GATEWAY_INTENTS".to_string(), "GUILDS,GUILD_MESSAGES".to_string()),
            ("GATEWAY_BACKOFF_BASE_MS".to_string(), "50".to_string()),
        ]);
        ClientConfig::from_lookup(|key| vars.get(key).cloned()).context("Invalid test configuration")
    }
}

async fn gateway_bot(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    let expected = format!("Bot {}", state.token);
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "401: Unauthorized", "code": 0 })),
        )
            .into_response();
    }

    Json(json!({
        "url": state.gateway_url,
        "shards": 1,
        "session_start_limit": {
            "total": 1000,
            "remaining": 999,
            "reset_after": 14_400_000,
            "max_concurrency": 1
        }
    }))
    .into_response()
}

async fn gateway_socket(ws: WebSocketUpgrade, State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_socket(state, socket))
}

async fn serve_socket(state: Arc<ServerState>, socket: WebSocket) {
    let (close_tx, mut close_rx) = mpsc::unbounded_channel();
    let index = {
        let mut sockets = state.sockets.lock();
        sockets.push(close_tx);
        sockets.len() - 1
    };

    let (mut sink, mut stream) = socket.split();
    if send(&mut sink, &GatewayMessage::hello(state.heartbeat_interval))
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            code = close_rx.recv() => {
                let frame = CloseFrame {
                    code: code.unwrap_or(1000),
                    reason: "mock close".into(),
                };
                let _ = sink.send(Message::Close(Some(frame))).await;
                break;
            }
            message = stream.next() => {
                let text = match message {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                };
                let Ok(frame) = GatewayMessage::from_json(&text) else {
                    continue;
                };

                let replies = replies_to(&state, &frame);
                let _ = state.frames.send((index, frame));
                for reply in replies {
                    if send(&mut sink, &reply).await.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

/// Scripted server behaviour
fn replies_to(state: &ServerState, frame: &GatewayMessage) -> Vec<GatewayMessage> {
    match frame.opcode() {
        Some(OpCode::Identify) => vec![
            GatewayMessage::dispatch(
                "READY",
                1,
                json!({
                    "v": 10,
                    "user": { "id": "1", "username": "integration-bot", "bot": true },
                    "session_id": TEST_SESSION,
                    "resume_gateway_url": state.gateway_url,
                }),
            ),
            GatewayMessage::dispatch("MESSAGE_CREATE", 2, json!({ "content": "hello" })),
        ],
        Some(OpCode::Resume) => {
            let seq = frame.d["seq"].as_u64().unwrap_or(0);
            vec![GatewayMessage::dispatch("RESUMED", seq + 1, Value::Null)]
        }
        Some(OpCode::Heartbeat) => vec![GatewayMessage::new(OpCode::HeartbeatAck, Value::Null)],
        _ => Vec::new(),
    }
}

async fn send<S>(sink: &mut S, message: &GatewayMessage) -> Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    sink.send(Message::Text(message.to_json()?)).await?;
    Ok(())
}

/// Forward every client event into a channel the test can await
pub fn event_channel(client: &chat_gateway::Client) -> mpsc::UnboundedReceiver<GatewayEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    client.on_any(move |event| {
        let _ = tx.send(event.clone());
    });
    rx
}

/// Wait for the next event named `name`, skipping others
pub async fn wait_for(rx: &mut mpsc::UnboundedReceiver<GatewayEvent>, name: &str) -> Result<GatewayEvent> {
    loop {
        let event = tokio::time::timeout(WAIT, rx.recv())
            .await
            .with_context(|| format!("Timed out waiting for {name}"))?
            .context("Event channel closed")?;
        if event.name() == name {
            return Ok(event);
        }
    }
}
