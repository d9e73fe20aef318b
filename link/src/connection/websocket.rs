//! WebSocket transport on top of `tokio-tungstenite`.
//!
//! [`WsConnector::open`] spawns one task per transport. The task performs
//! the handshake (bearer token in the `Authorization` header), pumps
//! frames in both directions and runs the reconnection loop described by
//! the request's [`ConnectionOptions`](crate::ConnectionOptions).

use futures_util::{SinkExt, StreamExt};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{
    client::IntoClientRequest,
    http::{header::AUTHORIZATION, HeaderValue},
    Message,
};

use crate::{
    connection::{
        transport::{Connector, OpenRequest, TransportEvent, TransportHandle},
        MAX_WS_TEXT_MESSAGE_BYTES,
    },
    error::{LinkError, Result},
    models::{ClientMessage, ConnectionError, DisconnectReason, InboundFrame},
    timeouts::LinkTimeouts,
};

type WebSocketStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Map an `http(s)://` or `ws(s)://` base URL to the WebSocket URL.
///
/// ```rust
/// use dashboard_link::resolve_ws_url;
///
/// assert_eq!(resolve_ws_url("https://api.example.com/ws").unwrap(), "wss://api.example.com/ws");
/// assert!(resolve_ws_url("ftp://example.com").is_err());
/// ```
pub fn resolve_ws_url(url: &str) -> Result<String> {
    let url = url.trim();
    let (scheme, rest) = if let Some(rest) = url.strip_prefix("http://") {
        ("ws", rest)
    } else if let Some(rest) = url.strip_prefix("https://") {
        ("wss", rest)
    } else if let Some(rest) = url.strip_prefix("ws://") {
        ("ws", rest)
    } else if let Some(rest) = url.strip_prefix("wss://") {
        ("wss", rest)
    } else {
        return Err(LinkError::ConfigurationError(format!(
            "Unsupported URL scheme (expected http, https, ws or wss): {}",
            url
        )));
    };

    if rest.is_empty() || rest.starts_with('/') {
        return Err(LinkError::ConfigurationError(format!("URL has no host: {}", url)));
    }
    Ok(format!("{}://{}", scheme, rest))
}

// ── Connector ───────────────────────────────────────────────────────────────

/// Production [`Connector`]: one WebSocket per transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for WsConnector {
    fn open(
        &self,
        request: OpenRequest,
        events: mpsc::Sender<TransportEvent>,
    ) -> Box<dyn TransportHandle> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(false));
        tokio::spawn(transport_task(request, cmd_rx, events, connected.clone()));
        Box::new(WsHandle { cmd_tx, connected })
    }
}

enum TransportCmd {
    Send(String),
    Close,
}

struct WsHandle {
    cmd_tx: mpsc::UnboundedSender<TransportCmd>,
    connected: Arc<AtomicBool>,
}

impl TransportHandle for WsHandle {
    fn send(&self, message: &ClientMessage) -> bool {
        if !self.is_connected() {
            return false;
        }
        match message.to_json() {
            Ok(text) => self.cmd_tx.send(TransportCmd::Send(text)).is_ok(),
            Err(e) => {
                log::warn!("[dashboard-link] Failed to serialize outbound message: {}", e);
                false
            },
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
        let _ = self.cmd_tx.send(TransportCmd::Close);
    }
}

impl Drop for WsHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(TransportCmd::Close);
    }
}

// ── Background transport task ───────────────────────────────────────────────

enum PumpExit {
    /// Close requested locally, or nobody listens for events any more.
    Shutdown,
    /// The connection dropped underneath us.
    Dropped(DisconnectReason),
}

async fn transport_task(
    request: OpenRequest,
    mut cmd_rx: mpsc::UnboundedReceiver<TransportCmd>,
    events: mpsc::Sender<TransportEvent>,
    connected: Arc<AtomicBool>,
) {
    let options = &request.options;
    let mut attempt: u32 = 0;
    let mut ever_connected = false;

    loop {
        match establish_ws(&request).await {
            Ok(mut ws) => {
                connected.store(true, Ordering::SeqCst);
                let event = if ever_connected || attempt > 0 {
                    TransportEvent::Reconnect { attempt }
                } else {
                    TransportEvent::Open
                };
                ever_connected = true;
                attempt = 0;
                if events.send(event).await.is_err() {
                    let _ = ws.close(None).await;
                    return;
                }

                let exit = pump(&mut ws, &mut cmd_rx, &events).await;
                connected.store(false, Ordering::SeqCst);
                match exit {
                    PumpExit::Shutdown => return,
                    PumpExit::Dropped(reason) => {
                        if events.send(TransportEvent::Close(reason)).await.is_err() {
                            return;
                        }
                    },
                }
            },
            Err(error) => {
                let recoverable = error.recoverable;
                if events.send(TransportEvent::Error(error)).await.is_err() {
                    return;
                }
                if !recoverable {
                    let _ = events.send(TransportEvent::ReconnectFailed).await;
                    return;
                }
            },
        }

        if !options.auto_reconnect {
            log::info!("[dashboard-link] Auto-reconnect disabled, transport finished");
            return;
        }
        if !options.allows_attempt(attempt) {
            log::warn!(
                "[dashboard-link] Max reconnection attempts ({}) reached",
                attempt
            );
            let _ = events.send(TransportEvent::ReconnectFailed).await;
            return;
        }

        attempt += 1;
        let delay = options.reconnect_delay(attempt);
        log::info!(
            "[dashboard-link] Attempting reconnection in {:?} (attempt {})",
            delay,
            attempt
        );
        if events
            .send(TransportEvent::ReconnectAttempt { attempt })
            .await
            .is_err()
        {
            return;
        }
        if !backoff(delay, &mut cmd_rx).await {
            log::debug!("[dashboard-link] Reconnection cancelled");
            return;
        }
    }
}

/// Sleep for `delay`, returning `false` if the transport was closed meanwhile.
async fn backoff(delay: Duration, cmd_rx: &mut mpsc::UnboundedReceiver<TransportCmd>) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            biased;
            cmd = cmd_rx.recv() => {
                match cmd {
                    // not connected; the message is dropped
                    Some(TransportCmd::Send(_)) => continue,
                    Some(TransportCmd::Close) | None => return false,
                }
            }
            _ = &mut sleep => return true,
        }
    }
}

async fn establish_ws(request: &OpenRequest) -> std::result::Result<WebSocketStream, ConnectionError> {
    log::debug!("[dashboard-link] Establishing WebSocket connection to {}", request.url);

    let mut ws_request = request.url.as_str().into_client_request().map_err(|e| {
        ConnectionError::new(format!("Failed to build WebSocket request: {}", e), false)
    })?;
    let bearer = HeaderValue::from_str(&format!("Bearer {}", request.token.as_str()))
        .map_err(|_| ConnectionError::new("Token is not a valid header value", false))?;
    ws_request.headers_mut().insert(AUTHORIZATION, bearer);

    let connect_result = if !LinkTimeouts::is_no_timeout(request.connection_timeout) {
        tokio::time::timeout(
            request.connection_timeout,
            tokio_tungstenite::connect_async(ws_request),
        )
        .await
    } else {
        Ok(tokio_tungstenite::connect_async(ws_request).await)
    };

    match connect_result {
        Ok(Ok((stream, _))) => Ok(stream),
        Ok(Err(tokio_tungstenite::tungstenite::error::Error::Http(response))) => {
            let status = response.status().as_u16();
            let message = match status {
                401 => "Unauthorized: WebSocket requires valid credentials".to_string(),
                403 => "Forbidden: Access to WebSocket denied".to_string(),
                code => format!("WebSocket HTTP error: {}", code),
            };
            Err(ConnectionError::new(message, !matches!(status, 401 | 403)))
        },
        Ok(Err(e)) => Err(ConnectionError::new(format!("Connection failed: {}", e), true)),
        Err(_) => Err(ConnectionError::new(
            format!("Connection timeout ({:?})", request.connection_timeout),
            true,
        )),
    }
}

async fn pump(
    ws: &mut WebSocketStream,
    cmd_rx: &mut mpsc::UnboundedReceiver<TransportCmd>,
    events: &mpsc::Sender<TransportEvent>,
) -> PumpExit {
    loop {
        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(TransportCmd::Send(text)) => {
                        if let Err(e) = ws.send(Message::Text(text.into())).await {
                            return PumpExit::Dropped(DisconnectReason::new(format!(
                                "Send failed: {}",
                                e
                            )));
                        }
                    },
                    Some(TransportCmd::Close) | None => {
                        let _ = ws.close(None).await;
                        return PumpExit::Shutdown;
                    },
                }
            }

            frame = ws.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if text.len() > MAX_WS_TEXT_MESSAGE_BYTES {
                            log::warn!("[dashboard-link] Text message too large ({} bytes)", text.len());
                            continue;
                        }
                        match InboundFrame::parse(text.as_str()) {
                            Ok(frame) => {
                                if events.send(TransportEvent::Message(frame)).await.is_err() {
                                    let _ = ws.close(None).await;
                                    return PumpExit::Shutdown;
                                }
                            },
                            Err(e) => log::warn!("[dashboard-link] Failed to parse WS message: {}", e),
                        }
                    },
                    Some(Ok(Message::Binary(data))) => {
                        log::debug!("[dashboard-link] Ignoring binary frame ({} bytes)", data.len());
                    },
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = ws.send(Message::Pong(payload)).await;
                    },
                    Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {},
                    Some(Ok(Message::Close(frame))) => {
                        let reason = match frame {
                            Some(f) => DisconnectReason::with_code(f.reason.as_str(), f.code.into()),
                            None => DisconnectReason::new("Server closed connection"),
                        };
                        return PumpExit::Dropped(reason);
                    },
                    Some(Err(e)) => {
                        return PumpExit::Dropped(DisconnectReason::new(format!("WebSocket error: {}", e)));
                    },
                    None => {
                        return PumpExit::Dropped(DisconnectReason::new("WebSocket stream ended"));
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_ws_url_maps_schemes() {
        assert_eq!(resolve_ws_url("http://localhost:8080").unwrap(), "ws://localhost:8080");
        assert_eq!(
            resolve_ws_url(" https://api.example.com/realtime ").unwrap(),
            "wss://api.example.com/realtime"
        );
        assert_eq!(resolve_ws_url("ws://127.0.0.1:9000/ws").unwrap(), "ws://127.0.0.1:9000/ws");
        assert_eq!(resolve_ws_url("wss://example.com").unwrap(), "wss://example.com");
    }

    #[test]
    fn test_resolve_ws_url_rejects_bad_input() {
        assert!(matches!(
            resolve_ws_url("ftp://example.com"),
            Err(LinkError::ConfigurationError(_))
        ));
        assert!(resolve_ws_url("localhost:8080").is_err());
        assert!(resolve_ws_url("https://").is_err());
        assert!(resolve_ws_url("http:///path").is_err());
    }

    #[tokio::test]
    async fn test_handle_refuses_send_before_handshake() {
        let (cmd_tx, _cmd_rx) = mpsc::unbounded_channel();
        let handle = WsHandle {
            cmd_tx,
            connected: Arc::new(AtomicBool::new(false)),
        };
        assert!(!handle.send(&ClientMessage::Ping { timestamp: 1 }));
        handle.connected.store(true, Ordering::SeqCst);
        assert!(handle.send(&ClientMessage::Ping { timestamp: 1 }));
        handle.close();
        assert!(!handle.is_connected());
    }
}
