//! Conversation list state: previews, unread counters, presence.

use std::collections::HashMap;

use courier_common::models::{Conversation, Message, PresenceStatus};

/// Outcome of feeding a broadcast message into the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterChange {
    /// A known conversation row was updated.
    Updated,
    /// The conversation is not in the list; the caller should refetch.
    Unknown,
}

/// In-memory conversation list for the signed-in user.
///
/// The unread counter for a conversation increments on inbound messages
/// from other senders while that conversation is not the active view,
/// and resets exactly when it becomes the active view.
#[derive(Debug)]
pub struct ConversationRoster {
    self_id: String,
    active: Option<String>,
    conversations: Vec<Conversation>,
    unread: HashMap<String, u32>,
}

impl ConversationRoster {
    pub fn new(self_id: impl Into<String>) -> Self {
        Self {
            self_id: self_id.into(),
            active: None,
            conversations: Vec::new(),
            unread: HashMap::new(),
        }
    }

    /// Replace the list from a fresh REST fetch. Unread counters reset;
    /// the server is authoritative at this point.
    pub fn set_conversations(&mut self, mut conversations: Vec<Conversation>) {
        conversations.sort_by(|a, b| b.last_message_timestamp.cmp(&a.last_message_timestamp));
        self.conversations = conversations;
        self.unread.clear();
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn get(&self, conversation_id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == conversation_id)
    }

    pub fn unread(&self, conversation_id: &str) -> u32 {
        self.unread.get(conversation_id).copied().unwrap_or(0)
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Switch the active view. Entering a conversation clears its unread
    /// counter.
    pub fn set_active(&mut self, conversation_id: Option<&str>) {
        self.active = conversation_id.map(String::from);
        if let Some(id) = conversation_id {
            self.unread.remove(id);
        }
    }

    /// Fold an inbound message into the list: bump the preview, re-sort,
    /// and count it as unread when it is someone else's message for a
    /// conversation that is not on screen.
    pub fn note_message(&mut self, message: &Message) -> RosterChange {
        let Some(conversation) =
            self.conversations.iter_mut().find(|c| c.id == message.conversation_id)
        else {
            return RosterChange::Unknown;
        };

        conversation.last_message = message.content.content.clone();
        conversation.last_message_timestamp = message.created_at;

        let foreign = message.sender_id != self.self_id;
        let inactive = self.active.as_deref() != Some(message.conversation_id.as_str());
        if foreign && inactive {
            *self.unread.entry(message.conversation_id.clone()).or_insert(0) += 1;
        }

        self.conversations
            .sort_by(|a, b| b.last_message_timestamp.cmp(&a.last_message_timestamp));
        RosterChange::Updated
    }

    /// Apply a presence broadcast to every two-party conversation the
    /// affected user participates in.
    pub fn apply_presence(&mut self, user_id: &str, status: PresenceStatus) {
        for conversation in &mut self.conversations {
            if conversation.opponent_of(&self.self_id) == Some(user_id) {
                conversation.status = Some(status);
            }
        }
    }
}
