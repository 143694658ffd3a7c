// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! WebSocket Transport
//!
//! Real transport implementation using tokio-tungstenite. Each socket runs
//! in its own task and reports its lifecycle through a [`SocketEventSink`].

use futures_util::{SinkExt, StreamExt};
use tokio::sync::oneshot;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};
use url::Url;

use super::error::NetworkError;
use super::transport::{Connector, SocketEvent, SocketEventSink, SocketHandle};

/// Path of the feed endpoint on the hosting origin.
pub const FEED_PATH: &str = "/ws";

/// Resolves the feed endpoint for an origin.
///
/// The scheme is upgraded (`http` to `ws`, `https` to `wss`), host and port
/// are kept, and the path is replaced by [`FEED_PATH`]. Origins that already
/// use `ws`/`wss` are accepted as-is apart from the path.
///
/// # Example
///
/// ```
/// use turnone_core::network::feed_url;
///
/// let url = feed_url("https://live.example.com:8443/dashboard").unwrap();
/// assert_eq!(url.as_str(), "wss://live.example.com:8443/ws");
/// ```
pub fn feed_url(origin: &str) -> Result<Url, NetworkError> {
    let mut url = Url::parse(origin.trim())
        .map_err(|e| NetworkError::InvalidOrigin(format!("{}: {}", origin, e)))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(NetworkError::UnsupportedScheme(other.to_string())),
    };

    if url.host_str().is_none() {
        return Err(NetworkError::InvalidOrigin(format!("{}: missing host", origin)));
    }

    url.set_scheme(scheme)
        .map_err(|_| NetworkError::UnsupportedScheme(url.scheme().to_string()))?;
    url.set_path(FEED_PATH);
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// Connector that opens feed sockets with tokio-tungstenite.
///
/// Must be used from within a tokio runtime: every `open` spawns the socket
/// task.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    /// Creates a new connector.
    pub fn new() -> Self {
        WebSocketConnector
    }
}

impl Connector for WebSocketConnector {
    fn open(&mut self, url: &Url, sink: SocketEventSink) -> Box<dyn SocketHandle> {
        let (close_tx, close_rx) = oneshot::channel();
        tokio::spawn(run_socket(url.to_string(), sink, close_rx));
        Box::new(WebSocketHandle {
            close: Some(close_tx),
        })
    }
}

/// Close handle for a socket task. Dropping it also closes the socket.
struct WebSocketHandle {
    close: Option<oneshot::Sender<()>>,
}

impl SocketHandle for WebSocketHandle {
    fn close(&mut self) {
        if let Some(tx) = self.close.take() {
            // The task may already have finished on its own.
            let _ = tx.send(());
        }
    }
}

async fn run_socket(url: String, sink: SocketEventSink, mut close_rx: oneshot::Receiver<()>) {
    debug!("socket {} connecting to {}", sink.id(), url);

    let stream = tokio::select! {
        result = connect_async(url.as_str()) => match result {
            Ok((stream, _response)) => stream,
            Err(e) => {
                let error = NetworkError::ConnectionFailed(e.to_string());
                sink.emit(SocketEvent::Error(error.to_string()));
                sink.emit(SocketEvent::Close);
                return;
            }
        },
        _ = &mut close_rx => {
            sink.emit(SocketEvent::Close);
            return;
        }
    };

    sink.emit(SocketEvent::Open);
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            _ = &mut close_rx => {
                if let Err(e) = write.send(Message::Close(None)).await {
                    debug!("socket {} close frame not sent: {}", sink.id(), e);
                }
                break;
            }
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => sink.emit(SocketEvent::Message(text.into_bytes())),
                Some(Ok(Message::Binary(data))) => sink.emit(SocketEvent::Message(data)),
                Some(Ok(Message::Close(_))) | None => break,
                // Ping/pong are answered by tungstenite itself.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("socket {} failed: {}", sink.id(), e);
                    sink.emit(SocketEvent::Error(NetworkError::Socket(e.to_string()).to_string()));
                    break;
                }
            }
        }
    }

    sink.emit(SocketEvent::Close);
}
