//! Configuration schema types for Courier.
//!
//! All structs use `serde(default)` so partial configs work correctly.

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

// =============================================================================
// Server Config
// =============================================================================

/// Where the chat server lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP base URL of the chat server. The WebSocket address is derived
    /// from this by swapping the scheme to its socket equivalent.
    pub url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".into(),
        }
    }
}

// =============================================================================
// Realtime Config
// =============================================================================

/// Tunables for the realtime connection and typing signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeSettings {
    /// Delay before a reconnect attempt after an unexpected close, in
    /// milliseconds. Fixed, not exponential.
    pub reconnect_delay_ms: u64,
    /// How long to wait for the socket handshake before giving up.
    pub connect_timeout_ms: u64,
    /// Quiet period after which a remote typing indicator clears.
    pub typing_quiet_ms: u64,
    /// Minimum spacing between outbound TYPING signals.
    pub typing_throttle_ms: u64,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: 3000,
            connect_timeout_ms: 5000,
            typing_quiet_ms: 2000,
            typing_throttle_ms: 1000,
        }
    }
}

// =============================================================================
// Root Config
// =============================================================================

/// Root configuration object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    pub server: ServerConfig,
    pub realtime: RealtimeSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_constants() {
        let config = CourierConfig::default();
        assert_eq!(config.realtime.reconnect_delay_ms, 3000);
        assert_eq!(config.realtime.typing_quiet_ms, 2000);
        assert_eq!(config.realtime.typing_throttle_ms, 1000);
        assert!(config.server.url.starts_with("http"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: CourierConfig = toml::from_str(
            r#"
            [server]
            url = "https://chat.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.url, "https://chat.example.com");
        assert_eq!(config.realtime.reconnect_delay_ms, 3000);
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let config: CourierConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.url, "http://localhost:3000");
    }
}
