//! Domain models shared between the REST client and the realtime core.
//!
//! Wire field names are camelCase to match the chat server's JSON; the
//! structs here are the single source of truth for that mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Kind of message content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Text,
    Image,
    System,
}

/// The content payload of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageContent {
    pub content: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
}

impl MessageContent {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: content.into(), kind: ContentKind::Text }
    }
}

/// Reactions a message can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Heart,
    Laugh,
}

/// A single reaction on a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    #[serde(rename = "type")]
    pub kind: ReactionKind,
    pub sender: String,
}

/// A persisted chat message as the server reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub content: MessageContent,
    #[serde(default)]
    pub reaction: Vec<Reaction>,
    pub sender_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_avatar: Option<String>,
}

/// Client-side delivery status of a timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sending,
    Sent,
    Read,
    Failed,
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

/// User presence status, broadcast to conversation participants on change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    #[default]
    Offline,
    Sleep,
    Dnd,
}

// ---------------------------------------------------------------------------
// Conversations & users
// ---------------------------------------------------------------------------

/// A conversation summary row as the server reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub participants: Vec<String>,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub last_message: String,
    pub last_message_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub pinned_by: Vec<String>,
    /// Opponent presence; only meaningful for two-party conversations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PresenceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// The other participant of a two-party conversation.
    pub fn opponent_of(&self, self_id: &str) -> Option<&str> {
        if self.participants.len() != 2 {
            return None;
        }
        self.participants
            .iter()
            .find(|p| p.as_str() != self_id)
            .map(String::as_str)
    }
}

/// A user profile as the REST API reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub tel: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub status: Option<PresenceStatus>,
}
