//! Wire envelopes for the chat socket.
//!
//! Every frame is one flat JSON object with a `type` discriminant and the
//! payload fields alongside it: `{ "type": "NEW_MESSAGE", "message": ... }`.
//! Both directions are closed tagged unions so new tags are a
//! compile-time-checked change.

use serde::{Deserialize, Serialize};

use courier_common::models::{ContentKind, Message, PresenceStatus, ReactionKind};

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Events the server pushes to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// A message was persisted and broadcast to conversation participants.
    NewMessage { message: Message },
    /// Acknowledgment of a previously sent message, carrying the
    /// correlation id and the authoritative message record.
    Ack { temp_id: String, message: Message },
    /// A message's content or reactions changed.
    MessageUpdated { message: Message },
    /// A message was deleted.
    MessageDeleted { message_id: String },
    /// A participant is typing in a conversation.
    UserTyping { conversation_id: String },
    /// A participant read the conversation.
    Read { conversation_id: String, reader_id: String },
    /// A user's presence status changed.
    StatusChange { user_id: String, status: PresenceStatus },
    /// Server-side error report.
    Error { error: String },
}

/// Tags of [`ServerEvent`], used as subscription keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NewMessage,
    Ack,
    MessageUpdated,
    MessageDeleted,
    UserTyping,
    Read,
    StatusChange,
    Error,
}

impl ServerEvent {
    /// The tag this event dispatches under.
    pub fn kind(&self) -> EventKind {
        match self {
            ServerEvent::NewMessage { .. } => EventKind::NewMessage,
            ServerEvent::Ack { .. } => EventKind::Ack,
            ServerEvent::MessageUpdated { .. } => EventKind::MessageUpdated,
            ServerEvent::MessageDeleted { .. } => EventKind::MessageDeleted,
            ServerEvent::UserTyping { .. } => EventKind::UserTyping,
            ServerEvent::Read { .. } => EventKind::Read,
            ServerEvent::StatusChange { .. } => EventKind::StatusChange,
            ServerEvent::Error { .. } => EventKind::Error,
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Content payload of an outbound SEND_MESSAGE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundContent {
    pub data: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
}

impl OutboundContent {
    pub fn text(data: impl Into<String>) -> Self {
        Self { data: data.into(), kind: ContentKind::Text }
    }
}

/// What a SEND_MESSAGE is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationType {
    Conversation,
    User,
}

/// Events the client transmits to the server.
///
/// Payload shape is the caller's responsibility; the transport layer does
/// not validate beyond serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    SendMessage {
        content: OutboundContent,
        destination_id: String,
        destination_type: DestinationType,
        temp_id: String,
    },
    EditMessage {
        message_id: String,
        new_content: String,
        to_user_id: String,
    },
    ReactMessage {
        message_id: String,
        reaction_type: ReactionKind,
        to_user_id: String,
    },
    DeleteMessage {
        message_id: String,
        to_user_id: String,
    },
    Typing { conversation_id: String },
    Read { conversation_id: String },
}
