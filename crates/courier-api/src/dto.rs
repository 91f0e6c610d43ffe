//! Request and response bodies specific to the REST surface.
//!
//! Domain types (messages, conversations, profiles) live in
//! `courier-common`; only the wrappers and write payloads are here.

use serde::{Deserialize, Serialize};

use courier_common::models::{ContentKind, Message, UserProfile};

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    /// Email address or phone number.
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub token: String,
}

/// Message history arrives newest-first, wrapped in `data`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessageHistory {
    pub data: Vec<Message>,
}

/// Body of POST /conversation. The first message rides along so the
/// server can create both atomically.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConversation {
    pub participants: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_message: Option<InitMessage>,
    pub sender_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitMessage {
    pub content: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedConversation {
    pub id: String,
}
