//! Background connection loop: connect, pump frames, reconnect.

use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use courier_common::SessionHandle;

use crate::dispatch::Dispatcher;
use crate::protocol::{ClientEvent, ServerEvent};
use crate::types::{ConnectionState, RealtimeConfig};

/// Close codes the server uses to reject the credential.
const CLOSE_AUTH_INVALID: u16 = 4001;
const CLOSE_AUTH_EXPIRED: u16 = 4003;

/// What to do after the server closed the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CloseDisposition {
    /// Retry after the fixed delay.
    Reconnect,
    /// Credential rejected; invalidate the session, no retry.
    AuthRejected,
}

pub(crate) fn close_disposition(code: u16) -> CloseDisposition {
    match code {
        CLOSE_AUTH_INVALID | CLOSE_AUTH_EXPIRED => CloseDisposition::AuthRejected,
        _ => CloseDisposition::Reconnect,
    }
}

enum SessionResult {
    /// Intentional teardown; stop for good.
    Shutdown,
    /// Server rejected the credential with an auth close code.
    AuthRejected(u16),
    /// Connection lost for any other reason; reconnect.
    Dropped(String),
}

/// Run the connection with auto-reconnect until shut down or the
/// credential is rejected.
pub(crate) async fn connection_loop(
    config: RealtimeConfig,
    token: String,
    status: Arc<Mutex<ConnectionState>>,
    dispatcher: Arc<Dispatcher>,
    session: SessionHandle,
    mut outbound_rx: mpsc::Receiver<ClientEvent>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    let url = config.ws_url(&token);

    loop {
        set_status(&status, ConnectionState::Connecting);
        tracing::info!(url = %config.base_url, "Connecting to chat socket...");

        match tokio::time::timeout(config.connect_timeout, connect_async(url.as_str())).await {
            Ok(Ok((ws, _))) => {
                set_status(&status, ConnectionState::Connected);
                tracing::info!("Chat socket connected");

                let result =
                    socket_session(ws, &dispatcher, &mut outbound_rx, &mut shutdown_rx).await;

                match result {
                    SessionResult::Shutdown => {
                        tracing::info!("Chat socket shutting down");
                        set_status(&status, ConnectionState::Disconnected);
                        return;
                    }
                    SessionResult::AuthRejected(code) => {
                        tracing::warn!(code, "Chat socket rejected credential");
                        set_status(&status, ConnectionState::Disconnected);
                        session.invalidate();
                        return;
                    }
                    SessionResult::Dropped(reason) => {
                        tracing::warn!(reason = %reason, "Chat socket connection lost");
                        set_status(&status, ConnectionState::Reconnecting);
                    }
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Failed to connect to chat socket");
                set_status(&status, ConnectionState::Reconnecting);
            }
            Err(_) => {
                tracing::warn!("Chat socket handshake timed out");
                set_status(&status, ConnectionState::Reconnecting);
            }
        }

        // A send can race the close; anything still queued must not
        // carry over into the next socket.
        while outbound_rx.try_recv().is_ok() {}

        // Fixed delay, not exponential. A shutdown signal cancels the
        // pending reconnect.
        tokio::select! {
            _ = tokio::time::sleep(config.reconnect_delay) => {}
            _ = shutdown_rx.recv() => {
                set_status(&status, ConnectionState::Disconnected);
                return;
            }
        }
    }
}

/// Pump one open socket: outbound events → frames, frames → dispatcher.
async fn socket_session(
    ws: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    dispatcher: &Dispatcher,
    outbound_rx: &mut mpsc::Receiver<ClientEvent>,
    shutdown_rx: &mut mpsc::Receiver<()>,
) -> SessionResult {
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            // Outbound events → serialize → send as one text frame
            event = outbound_rx.recv() => {
                match event {
                    Some(event) => {
                        let json = match serde_json::to_string(&event) {
                            Ok(json) => json,
                            Err(e) => {
                                tracing::warn!(error = %e, "Serialize failed, dropping outbound event");
                                continue;
                            }
                        };
                        if sink.send(Message::Text(json.into())).await.is_err() {
                            return SessionResult::Dropped("send failed".into());
                        }
                    }
                    None => {
                        // All client handles dropped
                        let _ = sink.close().await;
                        return SessionResult::Shutdown;
                    }
                }
            }

            // Inbound frames → parse → dispatch
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ServerEvent>(&text) {
                            Ok(event) => dispatcher.dispatch(&event),
                            Err(e) => {
                                // Malformed frames are dropped per-frame;
                                // the connection is unaffected.
                                tracing::debug!(error = %e, "Dropping malformed frame");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        if let Some(frame) = frame {
                            let code = u16::from(frame.code);
                            if close_disposition(code) == CloseDisposition::AuthRejected {
                                return SessionResult::AuthRejected(code);
                            }
                            return SessionResult::Dropped(format!("server closed (code {code})"));
                        }
                        return SessionResult::Dropped("server closed".into());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        return SessionResult::Dropped(format!("ws error: {e}"));
                    }
                    None => {
                        return SessionResult::Dropped("stream ended".into());
                    }
                }
            }

            // Intentional teardown
            _ = shutdown_rx.recv() => {
                let _ = sink.close().await;
                return SessionResult::Shutdown;
            }
        }
    }
}

fn set_status(status: &Arc<Mutex<ConnectionState>>, next: ConnectionState) {
    *status.lock().unwrap() = next;
}
