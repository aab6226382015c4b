//! Socket transport
//!
//! The supervisor never touches a WebSocket directly. It asks a [`Transport`]
//! to open one and then talks to it over two channels: commands in,
//! [`SocketEvent`]s out. Tests substitute a scripted transport.

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

/// Close code reported when the socket died without a close frame
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// How long to wait for the server to answer our close frame
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle events of one socket, in the order they happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Opened,
    /// A text frame
    Frame(String),
    /// A transport error; a `Closed` always follows
    Error(String),
    Closed { code: u16, reason: String },
}

/// Instructions to the socket task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketCommand {
    Send(String),
    Close { code: u16, reason: String },
}

/// Opens sockets
pub trait Transport: Send + Sync + 'static {
    /// Start connecting to `url`
    ///
    /// Must return immediately; success or failure is reported through
    /// `events`. Dropping the returned sender closes the socket.
    fn open(
        &self,
        url: &str,
        events: mpsc::UnboundedSender<SocketEvent>,
    ) -> mpsc::UnboundedSender<SocketCommand>;
}

/// `tokio-tungstenite` transport (TLS via rustls)
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl Transport for WebSocketTransport {
    fn open(
        &self,
        url: &str,
        events: mpsc::UnboundedSender<SocketEvent>,
    ) -> mpsc::UnboundedSender<SocketCommand> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_socket(url.to_string(), events, rx));
        tx
    }
}

async fn run_socket(
    url: String,
    events: mpsc::UnboundedSender<SocketEvent>,
    mut commands: mpsc::UnboundedReceiver<SocketCommand>,
) {
    let socket = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((socket, _response)) => socket,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "WebSocket connect failed");
            let _ = events.send(SocketEvent::Error(e.to_string()));
            let _ = events.send(SocketEvent::Closed {
                code: ABNORMAL_CLOSURE,
                reason: "connect failed".to_string(),
            });
            return;
        }
    };

    tracing::debug!(url = %url, "WebSocket connected");
    let _ = events.send(SocketEvent::Opened);

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            command = commands.recv() => {
                let (code, reason) = match command {
                    Some(SocketCommand::Send(text)) => {
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            tracing::warn!(error = %e, "WebSocket send failed");
                        }
                        continue;
                    }
                    Some(SocketCommand::Close { code, reason }) => (code, reason),
                    None => (1000, String::new()),
                };

                let frame = CloseFrame {
                    code: WsCloseCode::from(code),
                    reason: reason.into(),
                };
                if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                    tracing::debug!(error = %e, "WebSocket close frame not sent");
                }
                break;
            }
            message = stream.next() => {
                let closed = match message {
                    Some(Ok(Message::Text(text))) => {
                        let _ = events.send(SocketEvent::Frame(text));
                        None
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        tracing::debug!(len = bytes.len(), "Ignoring binary frame");
                        None
                    }
                    Some(Ok(Message::Close(frame))) => Some(frame.map_or_else(
                        || (1005, String::new()),
                        |f| (u16::from(f.code), f.reason.into_owned()),
                    )),
                    Some(Ok(_)) => None,
                    Some(Err(e)) => {
                        let _ = events.send(SocketEvent::Error(e.to_string()));
                        Some((ABNORMAL_CLOSURE, e.to_string()))
                    }
                    None => Some((ABNORMAL_CLOSURE, "connection reset".to_string())),
                };

                if let Some((code, reason)) = closed {
                    tracing::debug!(code, reason = %reason, "WebSocket closed by peer");
                    let _ = events.send(SocketEvent::Closed { code, reason });
                    return;
                }
            }
        }
    }

    // We initiated the close; give the server a moment to answer it.
    let _ = tokio::time::timeout(CLOSE_TIMEOUT, async {
        while let Some(message) = stream.next().await {
            if matches!(message, Ok(Message::Close(_)) | Err(_)) {
                break;
            }
        }
    })
    .await;
    tracing::debug!(url = %url, "WebSocket task finished");
}
