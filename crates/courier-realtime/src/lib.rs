//! Realtime messaging client over a single WebSocket.
//!
//! Provides the connection manager for the chat server's socket endpoint
//! using `tokio-tungstenite`: connect/disconnect lifecycle keyed by the
//! session credential, fixed-delay auto-reconnect on unexpected closure,
//! auth-rejection close codes, and tag-keyed dispatch of typed inbound
//! events to registered subscribers.
//!
//! # Architecture
//!
//! [`RealtimeClient`] is an owned handle with explicit lifecycle methods;
//! it spawns a background connection loop that owns the socket exclusively.
//! Outbound events travel over an mpsc channel to the loop; inbound frames
//! are parsed into [`ServerEvent`] and fanned out through the
//! [`Dispatcher`] in subscriber registration order.

mod client;
mod connection;
mod dispatch;
mod protocol;
mod types;

pub use client::RealtimeClient;
pub use dispatch::{Dispatcher, SubscriptionId};
pub use protocol::{ClientEvent, DestinationType, EventKind, OutboundContent, ServerEvent};
pub use types::{ConnectionState, RealtimeConfig};
