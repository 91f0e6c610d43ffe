//! Configuration and connection state for the realtime client.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for connecting to the chat socket.
#[derive(Clone)]
pub struct RealtimeConfig {
    /// HTTP base URL of the chat server (scheme is swapped for the socket).
    pub base_url: String,
    /// Delay before a reconnect attempt after an unexpected close. Fixed,
    /// not exponential.
    pub reconnect_delay: Duration,
    /// How long to wait for the WebSocket handshake.
    pub connect_timeout: Duration,
}

impl std::fmt::Debug for RealtimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeConfig")
            .field("base_url", &self.base_url)
            .field("reconnect_delay", &self.reconnect_delay)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
            reconnect_delay: Duration::from_millis(3000),
            connect_timeout: Duration::from_millis(5000),
        }
    }
}

impl RealtimeConfig {
    /// Build the socket URL for a credential: scheme swapped to its socket
    /// equivalent, token embedded as a path segment.
    pub(crate) fn ws_url(&self, token: &str) -> String {
        let base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };
        format!("{}/ws/{token}", base.trim_end_matches('/'))
    }
}

// ---------------------------------------------------------------------------
// Connection state
// ---------------------------------------------------------------------------

/// Lifecycle state of the single socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket and no loop running.
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Socket open.
    Connected,
    /// Unexpectedly closed; the loop is waiting out the reconnect delay.
    Reconnecting,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Whether a connection loop is alive (anything but fully down).
    pub fn is_active(self) -> bool {
        !matches!(self, ConnectionState::Disconnected)
    }
}
