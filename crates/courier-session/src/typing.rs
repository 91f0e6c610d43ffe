//! Typing indicator state machines.
//!
//! The wire protocol has no "stopped typing" event; the indicator clears
//! by letting a quiet window expire. Both directions take the current
//! instant as a parameter so tests control the clock.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Inbound side: who is typing where, with deadline-based expiry.
///
/// Each typing event (re)starts the quiet window for its conversation;
/// the indicator shows until the window elapses with no further event.
#[derive(Debug)]
pub struct TypingIndicator {
    quiet: Duration,
    deadlines: HashMap<String, Instant>,
}

impl TypingIndicator {
    pub fn new(quiet: Duration) -> Self {
        Self { quiet, deadlines: HashMap::new() }
    }

    pub fn note_typing(&mut self, conversation_id: &str, now: Instant) {
        self.deadlines.insert(conversation_id.to_string(), now + self.quiet);
    }

    pub fn is_typing(&mut self, conversation_id: &str, now: Instant) -> bool {
        match self.deadlines.get(conversation_id) {
            Some(deadline) if now < *deadline => true,
            Some(_) => {
                self.deadlines.remove(conversation_id);
                false
            }
            None => false,
        }
    }

    /// A delivered message ends the typing display immediately.
    pub fn clear(&mut self, conversation_id: &str) {
        self.deadlines.remove(conversation_id);
    }
}

/// Outbound side: rate-limit TYPING frames per conversation so one frame
/// goes out per interval however fast the user types.
#[derive(Debug)]
pub struct TypingThrottle {
    interval: Duration,
    last_sent: HashMap<String, Instant>,
}

impl TypingThrottle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last_sent: HashMap::new() }
    }

    /// Whether a TYPING frame should go out now; records the send when so.
    pub fn should_send(&mut self, conversation_id: &str, now: Instant) -> bool {
        match self.last_sent.get(conversation_id) {
            Some(last) if now.duration_since(*last) < self.interval => false,
            _ => {
                self.last_sent.insert(conversation_id.to_string(), now);
                true
            }
        }
    }
}
