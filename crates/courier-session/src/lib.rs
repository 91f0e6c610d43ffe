//! Client-side chat state: optimistic send/acknowledgment reconciliation,
//! the conversation roster with unread counters, and typing indicators.
//!
//! The rules live in pure modules ([`timeline`], [`roster`], [`typing`])
//! that take their inputs as plain values; [`chat`] wires them to the
//! socket dispatcher and the REST client.

pub mod chat;
pub mod roster;
pub mod timeline;
pub mod typing;

pub use chat::{ChatSession, ChatTuning, RosterSession};
pub use roster::{ConversationRoster, RosterChange};
pub use timeline::{MessageTimeline, TimelineEntry};
pub use typing::{TypingIndicator, TypingThrottle};
