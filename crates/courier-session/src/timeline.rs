//! Per-conversation message timeline with optimistic sends.
//!
//! Pure in-memory state: no IO, no clocks beyond the timestamps it is
//! handed. The async glue in [`crate::chat`] feeds it socket events; the
//! rules live here so they are testable in isolation.
//!
//! The central invariant is id uniqueness: an entry is keyed by its
//! correlation id while unconfirmed and by the server id after, and no
//! two entries ever share the same server id.

use chrono::Utc;

use courier_common::id::new_temp_id;
use courier_common::models::{DeliveryStatus, Message, MessageContent};

/// One rendered message: the record plus client-side delivery state.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub message: Message,
    pub status: DeliveryStatus,
    /// Sent by the local user (either optimistically or confirmed).
    pub mine: bool,
}

/// Order-preserving message sequence for one open conversation.
#[derive(Debug)]
pub struct MessageTimeline {
    conversation_id: String,
    self_id: String,
    entries: Vec<TimelineEntry>,
}

impl MessageTimeline {
    pub fn new(conversation_id: impl Into<String>, self_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            self_id: self_id.into(),
            entries: Vec::new(),
        }
    }

    /// Seed from REST history (chronological order, all confirmed).
    pub fn from_history(
        conversation_id: impl Into<String>,
        self_id: impl Into<String>,
        history: Vec<Message>,
    ) -> Self {
        let mut timeline = Self::new(conversation_id, self_id);
        for message in history {
            let mine = message.sender_id == timeline.self_id;
            timeline.entries.push(TimelineEntry { message, status: DeliveryStatus::Sent, mine });
        }
        timeline
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.message.id == id)
    }

    /// Append a placeholder for a message the user just sent and return
    /// its correlation id. The entry renders immediately with status
    /// `sending`; [`apply_ack`] later swaps in the server record.
    ///
    /// [`apply_ack`]: MessageTimeline::apply_ack
    pub fn push_optimistic(&mut self, content: MessageContent) -> String {
        let temp_id = new_temp_id();
        self.entries.push(TimelineEntry {
            message: Message {
                id: temp_id.clone(),
                conversation_id: self.conversation_id.clone(),
                content,
                reaction: vec![],
                sender_id: self.self_id.clone(),
                created_at: Utc::now(),
                updated_at: None,
                sender_name: None,
                sender_avatar: None,
            },
            status: DeliveryStatus::Sending,
            mine: true,
        });
        temp_id
    }

    /// Resolve a correlation id against the server's acknowledgment.
    ///
    /// The placeholder keeps its position; only the record is replaced.
    /// Returns false when no entry carries the correlation id anymore
    /// (view rebuilt, or a broadcast echo already landed the server id),
    /// in which case the acknowledgment is dropped.
    pub fn apply_ack(&mut self, temp_id: &str, message: Message) -> bool {
        if self.position(&message.id).is_some() {
            // The echo won the race; retire the placeholder if it is
            // still around so the server id stays unique.
            if let Some(idx) = self.position(temp_id) {
                self.entries.remove(idx);
            }
            return false;
        }
        let Some(idx) = self.position(temp_id) else {
            return false;
        };
        self.entries[idx] = TimelineEntry { message, status: DeliveryStatus::Sent, mine: true };
        true
    }

    /// Ingest a broadcast message for this conversation.
    ///
    /// Duplicates by id are skipped, as is the sender's own echo while a
    /// matching placeholder is still awaiting its acknowledgment.
    /// Returns true when an entry was appended.
    pub fn insert_broadcast(&mut self, message: Message) -> bool {
        if message.conversation_id != self.conversation_id {
            return false;
        }
        if self.position(&message.id).is_some() {
            return false;
        }
        let mine = message.sender_id == self.self_id;
        if mine && self.has_pending_with_content(&message.content) {
            return false;
        }
        self.entries.push(TimelineEntry { message, status: DeliveryStatus::Sent, mine });
        true
    }

    fn has_pending_with_content(&self, content: &MessageContent) -> bool {
        self.entries
            .iter()
            .any(|e| e.status == DeliveryStatus::Sending && e.message.content == *content)
    }

    /// Replace content and reactions of an edited message in place.
    pub fn apply_update(&mut self, message: Message) {
        if let Some(idx) = self.position(&message.id) {
            let entry = &mut self.entries[idx];
            entry.message.content = message.content;
            entry.message.reaction = message.reaction;
            entry.message.updated_at = message.updated_at;
        }
    }

    pub fn apply_delete(&mut self, message_id: &str) {
        if let Some(idx) = self.position(message_id) {
            self.entries.remove(idx);
        }
    }

    /// Whole-conversation read receipt: every confirmed outgoing message
    /// flips to `read`.
    pub fn apply_read(&mut self) {
        for entry in &mut self.entries {
            if entry.mine && entry.status == DeliveryStatus::Sent {
                entry.status = DeliveryStatus::Read;
            }
        }
    }

    /// Mark a placeholder as failed (REST path for draft conversations).
    pub fn mark_failed(&mut self, temp_id: &str) {
        if let Some(idx) = self.position(temp_id) {
            self.entries[idx].status = DeliveryStatus::Failed;
        }
    }

    /// Rebind the timeline to a freshly allocated conversation id.
    pub fn assign_conversation(&mut self, conversation_id: impl Into<String>) {
        self.conversation_id = conversation_id.into();
        for entry in &mut self.entries {
            entry.message.conversation_id = self.conversation_id.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_common::id::is_temp_id;
    use courier_common::models::{Reaction, ReactionKind};

    fn server_message(id: &str, conversation_id: &str, sender_id: &str, text: &str) -> Message {
        Message {
            id: id.into(),
            conversation_id: conversation_id.into(),
            content: MessageContent::text(text),
            reaction: vec![],
            sender_id: sender_id.into(),
            created_at: "2024-05-01T12:00:00Z".parse().unwrap(),
            updated_at: None,
            sender_name: None,
            sender_avatar: None,
        }
    }

    #[test]
    fn optimistic_send_then_ack_swaps_id_in_place() {
        let mut timeline = MessageTimeline::new("conv1", "u1");
        timeline.insert_broadcast(server_message("m0", "conv1", "u2", "hello"));

        let temp_id = timeline.push_optimistic(MessageContent::text("hi"));
        assert!(is_temp_id(&temp_id));
        assert_eq!(timeline.entries()[1].message.id, temp_id);
        assert_eq!(timeline.entries()[1].status, DeliveryStatus::Sending);
        assert!(timeline.entries()[1].mine);

        let acked = server_message("m1", "conv1", "u1", "hi");
        assert!(timeline.apply_ack(&temp_id, acked));

        // Same position, server id, confirmed, correlation id gone.
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.entries()[1].message.id, "m1");
        assert_eq!(timeline.entries()[1].status, DeliveryStatus::Sent);
        assert!(timeline.entries().iter().all(|e| e.message.id != temp_id));
    }

    #[test]
    fn no_two_entries_share_a_final_id() {
        let mut timeline = MessageTimeline::new("conv1", "u1");
        let msg = server_message("m1", "conv1", "u2", "hello");
        assert!(timeline.insert_broadcast(msg.clone()));
        assert!(!timeline.insert_broadcast(msg));
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn ack_after_broadcast_echo_retires_the_placeholder() {
        let mut timeline = MessageTimeline::new("conv1", "u1");
        let temp_id = timeline.push_optimistic(MessageContent::text("hi"));

        // The server id arrives under a different content (say, trimmed
        // by the server), so the echo guard does not catch it.
        assert!(timeline.insert_broadcast(server_message("m1", "conv1", "u1", "hi ")));
        assert!(!timeline.apply_ack(&temp_id, server_message("m1", "conv1", "u1", "hi ")));

        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.entries()[0].message.id, "m1");
    }

    #[test]
    fn own_echo_is_suppressed_while_placeholder_pends() {
        let mut timeline = MessageTimeline::new("conv1", "u1");
        let temp_id = timeline.push_optimistic(MessageContent::text("hi"));

        assert!(!timeline.insert_broadcast(server_message("m1", "conv1", "u1", "hi")));
        assert_eq!(timeline.len(), 1);

        // The acknowledgment still resolves normally afterwards.
        assert!(timeline.apply_ack(&temp_id, server_message("m1", "conv1", "u1", "hi")));
        assert_eq!(timeline.entries()[0].message.id, "m1");
    }

    #[test]
    fn ack_without_placeholder_is_dropped() {
        let mut timeline = MessageTimeline::new("conv1", "u1");
        assert!(!timeline.apply_ack("tmp-gone", server_message("m1", "conv1", "u1", "hi")));
        assert!(timeline.is_empty());
    }

    #[test]
    fn broadcast_for_another_conversation_is_ignored() {
        let mut timeline = MessageTimeline::new("conv2", "u1");
        assert!(!timeline.insert_broadcast(server_message("m1", "conv1", "u2", "hello")));
        assert!(timeline.is_empty());
    }

    #[test]
    fn update_replaces_content_and_reactions_in_place() {
        let mut timeline = MessageTimeline::new("conv1", "u1");
        timeline.insert_broadcast(server_message("m1", "conv1", "u2", "helo"));
        timeline.insert_broadcast(server_message("m2", "conv1", "u2", "next"));

        let mut edited = server_message("m1", "conv1", "u2", "hello");
        edited.reaction.push(Reaction { kind: ReactionKind::Heart, sender: "u1".into() });
        timeline.apply_update(edited);

        assert_eq!(timeline.entries()[0].message.content.content, "hello");
        assert_eq!(timeline.entries()[0].message.reaction.len(), 1);
        assert_eq!(timeline.entries()[1].message.id, "m2");
    }

    #[test]
    fn delete_removes_by_id() {
        let mut timeline = MessageTimeline::new("conv1", "u1");
        timeline.insert_broadcast(server_message("m1", "conv1", "u2", "a"));
        timeline.insert_broadcast(server_message("m2", "conv1", "u2", "b"));

        timeline.apply_delete("m1");
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.entries()[0].message.id, "m2");

        timeline.apply_delete("m1");
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn read_receipt_flips_own_sent_messages_only() {
        let mut timeline = MessageTimeline::new("conv1", "u1");
        timeline.insert_broadcast(server_message("m1", "conv1", "u2", "theirs"));
        let temp_id = timeline.push_optimistic(MessageContent::text("pending"));
        timeline.insert_broadcast(server_message("m2", "conv1", "u1", "mine"));

        timeline.apply_read();

        assert_eq!(timeline.entries()[0].status, DeliveryStatus::Sent);
        assert_eq!(timeline.entries()[1].status, DeliveryStatus::Sending);
        assert_eq!(timeline.entries()[2].status, DeliveryStatus::Read);
        let _ = temp_id;
    }

    #[test]
    fn failed_draft_send_is_marked() {
        let mut timeline = MessageTimeline::new("", "u1");
        let temp_id = timeline.push_optimistic(MessageContent::text("hi"));
        timeline.mark_failed(&temp_id);
        assert_eq!(timeline.entries()[0].status, DeliveryStatus::Failed);
    }

    #[test]
    fn history_seeds_confirmed_entries() {
        let history = vec![
            server_message("m1", "conv1", "u2", "a"),
            server_message("m2", "conv1", "u1", "b"),
        ];
        let timeline = MessageTimeline::from_history("conv1", "u1", history);
        assert_eq!(timeline.len(), 2);
        assert!(!timeline.entries()[0].mine);
        assert!(timeline.entries()[1].mine);
        assert_eq!(timeline.entries()[1].status, DeliveryStatus::Sent);
    }
}
