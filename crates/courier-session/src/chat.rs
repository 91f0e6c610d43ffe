//! Live chat state: socket events and REST calls folded into the pure
//! timeline/roster/typing modules.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::warn;

use courier_api::{ApiClient, ApiError, InitMessage, NewConversation};
use courier_common::models::{MessageContent, ReactionKind};
use courier_common::{CourierError, SessionHandle};
use courier_realtime::{
    ClientEvent, DestinationType, EventKind, OutboundContent, RealtimeClient, ServerEvent,
    SubscriptionId,
};

use crate::roster::{ConversationRoster, RosterChange};
use crate::timeline::{MessageTimeline, TimelineEntry};
use crate::typing::{TypingIndicator, TypingThrottle};

fn api_err(e: ApiError) -> CourierError {
    match e {
        ApiError::Unauthorized => CourierError::Session("session expired".into()),
        other => CourierError::Api(other.to_string()),
    }
}

/// Timing knobs for the typing indicator, sourced from config.
#[derive(Debug, Clone, Copy)]
pub struct ChatTuning {
    pub typing_quiet: Duration,
    pub typing_throttle: Duration,
}

impl Default for ChatTuning {
    fn default() -> Self {
        Self {
            typing_quiet: Duration::from_millis(2000),
            typing_throttle: Duration::from_millis(1000),
        }
    }
}

/// Where outgoing messages go.
#[derive(Debug, Clone)]
enum Destination {
    /// Server-allocated conversation; messages use the socket.
    Conversation(String),
    /// No conversation exists yet; the first message goes over REST so
    /// the server can allocate an id.
    Draft { recipient_id: String },
}

// ---------------------------------------------------------------------------
// ChatSession
// ---------------------------------------------------------------------------

/// One open conversation view.
///
/// Subscribes to the socket events that concern its conversation and
/// releases those subscriptions on drop. The timeline it maintains is
/// discarded with it.
pub struct ChatSession {
    api: ApiClient,
    realtime: RealtimeClient,
    self_id: String,
    destination: Mutex<Destination>,
    timeline: Arc<Mutex<MessageTimeline>>,
    typing: Arc<Mutex<TypingIndicator>>,
    throttle: Mutex<TypingThrottle>,
    subscriptions: Vec<SubscriptionId>,
}

impl ChatSession {
    /// Open an existing conversation, fetching its history over REST.
    pub async fn open(
        api: ApiClient,
        realtime: RealtimeClient,
        session: &SessionHandle,
        conversation_id: &str,
        tuning: ChatTuning,
    ) -> courier_common::Result<Self> {
        let self_id = signed_in_user(session)?;
        let history = api.message_history(conversation_id).await.map_err(api_err)?;
        let timeline = MessageTimeline::from_history(conversation_id, &self_id, history);
        Ok(Self::attach(api, realtime, self_id, Destination::Conversation(conversation_id.into()), timeline, tuning))
    }

    /// Resume a conversation from an already-built timeline, without a
    /// history fetch.
    pub fn resume(
        api: ApiClient,
        realtime: RealtimeClient,
        session: &SessionHandle,
        timeline: MessageTimeline,
        tuning: ChatTuning,
    ) -> courier_common::Result<Self> {
        let self_id = signed_in_user(session)?;
        let destination = Destination::Conversation(timeline.conversation_id().to_string());
        Ok(Self::attach(api, realtime, self_id, destination, timeline, tuning))
    }

    /// Start a draft conversation with a user no conversation exists
    /// with yet.
    pub fn draft(
        api: ApiClient,
        realtime: RealtimeClient,
        session: &SessionHandle,
        recipient_id: &str,
        tuning: ChatTuning,
    ) -> courier_common::Result<Self> {
        let self_id = signed_in_user(session)?;
        let timeline = MessageTimeline::new("", &self_id);
        let destination = Destination::Draft { recipient_id: recipient_id.into() };
        Ok(Self::attach(api, realtime, self_id, destination, timeline, tuning))
    }

    fn attach(
        api: ApiClient,
        realtime: RealtimeClient,
        self_id: String,
        destination: Destination,
        timeline: MessageTimeline,
        tuning: ChatTuning,
    ) -> Self {
        let timeline = Arc::new(Mutex::new(timeline));
        let typing = Arc::new(Mutex::new(TypingIndicator::new(tuning.typing_quiet)));

        let mut subscriptions = Vec::new();

        {
            let timeline = timeline.clone();
            let typing = typing.clone();
            subscriptions.push(realtime.subscribe(EventKind::NewMessage, move |event| {
                if let ServerEvent::NewMessage { message } = event {
                    let conversation_id = message.conversation_id.clone();
                    if timeline.lock().unwrap().insert_broadcast(message.clone()) {
                        typing.lock().unwrap().clear(&conversation_id);
                    }
                }
            }));
        }
        {
            let timeline = timeline.clone();
            subscriptions.push(realtime.subscribe(EventKind::Ack, move |event| {
                if let ServerEvent::Ack { temp_id, message } = event {
                    timeline.lock().unwrap().apply_ack(temp_id, message.clone());
                }
            }));
        }
        {
            let timeline = timeline.clone();
            subscriptions.push(realtime.subscribe(EventKind::MessageUpdated, move |event| {
                if let ServerEvent::MessageUpdated { message } = event {
                    timeline.lock().unwrap().apply_update(message.clone());
                }
            }));
        }
        {
            let timeline = timeline.clone();
            subscriptions.push(realtime.subscribe(EventKind::MessageDeleted, move |event| {
                if let ServerEvent::MessageDeleted { message_id } = event {
                    timeline.lock().unwrap().apply_delete(message_id);
                }
            }));
        }
        {
            let timeline = timeline.clone();
            let self_id = self_id.clone();
            subscriptions.push(realtime.subscribe(EventKind::Read, move |event| {
                if let ServerEvent::Read { conversation_id, reader_id } = event {
                    if *reader_id == self_id {
                        return;
                    }
                    let mut timeline = timeline.lock().unwrap();
                    if timeline.conversation_id() == conversation_id {
                        timeline.apply_read();
                    }
                }
            }));
        }
        {
            let typing = typing.clone();
            subscriptions.push(realtime.subscribe(EventKind::UserTyping, move |event| {
                if let ServerEvent::UserTyping { conversation_id } = event {
                    typing.lock().unwrap().note_typing(conversation_id, Instant::now());
                }
            }));
        }

        Self {
            api,
            realtime,
            self_id,
            destination: Mutex::new(destination),
            timeline,
            typing,
            throttle: Mutex::new(TypingThrottle::new(tuning.typing_throttle)),
            subscriptions,
        }
    }

    /// Snapshot of the rendered sequence.
    pub fn entries(&self) -> Vec<TimelineEntry> {
        self.timeline.lock().unwrap().entries().to_vec()
    }

    pub fn conversation_id(&self) -> Option<String> {
        match &*self.destination.lock().unwrap() {
            Destination::Conversation(id) => Some(id.clone()),
            Destination::Draft { .. } => None,
        }
    }

    /// Send a text message and return its correlation id.
    ///
    /// The placeholder renders immediately. On the socket path a closed
    /// connection drops the frame with only a log line; on the draft
    /// REST path a failure marks the placeholder failed.
    pub async fn send_message(&self, text: impl Into<String>) -> String {
        let content = MessageContent::text(text);
        let temp_id = self.timeline.lock().unwrap().push_optimistic(content.clone());

        let destination = self.destination.lock().unwrap().clone();
        match destination {
            Destination::Conversation(conversation_id) => {
                let event = ClientEvent::SendMessage {
                    content: OutboundContent { data: content.content, kind: content.kind },
                    destination_id: conversation_id,
                    destination_type: DestinationType::Conversation,
                    temp_id: temp_id.clone(),
                };
                if let Err(e) = self.realtime.send(event) {
                    warn!(error = %e, "socket not open, outbound message dropped");
                }
            }
            Destination::Draft { recipient_id } => {
                let body = NewConversation {
                    participants: vec![self.self_id.clone(), recipient_id],
                    init_message: Some(InitMessage {
                        content: content.content,
                        kind: content.kind,
                    }),
                    sender_id: self.self_id.clone(),
                };
                match self.api.create_conversation(&body).await {
                    Ok(created) => self.adopt_conversation(&created.id).await,
                    Err(e) => {
                        warn!(error = %e, "failed to create conversation");
                        self.timeline.lock().unwrap().mark_failed(&temp_id);
                    }
                }
            }
        }
        temp_id
    }

    /// Switch a draft over to its freshly allocated conversation and
    /// reload the authoritative history.
    async fn adopt_conversation(&self, conversation_id: &str) {
        *self.destination.lock().unwrap() = Destination::Conversation(conversation_id.into());
        match self.api.message_history(conversation_id).await {
            Ok(history) => {
                *self.timeline.lock().unwrap() =
                    MessageTimeline::from_history(conversation_id, &self.self_id, history);
            }
            Err(e) => {
                warn!(error = %e, "failed to load history for new conversation");
                self.timeline.lock().unwrap().assign_conversation(conversation_id);
            }
        }
    }

    /// Edit one of our messages. The server confirms with a
    /// MESSAGE_UPDATED broadcast, which patches the timeline.
    pub fn edit_message(&self, message_id: &str, new_content: &str, to_user_id: &str) {
        self.fire(ClientEvent::EditMessage {
            message_id: message_id.into(),
            new_content: new_content.into(),
            to_user_id: to_user_id.into(),
        });
    }

    /// Toggle a reaction on a message.
    pub fn react(&self, message_id: &str, reaction: ReactionKind, to_user_id: &str) {
        self.fire(ClientEvent::ReactMessage {
            message_id: message_id.into(),
            reaction_type: reaction,
            to_user_id: to_user_id.into(),
        });
    }

    /// Delete one of our messages. The MESSAGE_DELETED broadcast removes
    /// it from the timeline.
    pub fn delete_message(&self, message_id: &str, to_user_id: &str) {
        self.fire(ClientEvent::DeleteMessage {
            message_id: message_id.into(),
            to_user_id: to_user_id.into(),
        });
    }

    fn fire(&self, event: ClientEvent) {
        if let Err(e) = self.realtime.send(event) {
            warn!(error = %e, "socket not open, event dropped");
        }
    }

    /// Signal that the user is typing, at most one frame per throttle
    /// interval.
    pub fn notify_typing(&self) {
        let Destination::Conversation(conversation_id) = self.destination.lock().unwrap().clone()
        else {
            return;
        };
        if !self.throttle.lock().unwrap().should_send(&conversation_id, Instant::now()) {
            return;
        }
        let event = ClientEvent::Typing { conversation_id };
        if let Err(e) = self.realtime.send(event) {
            warn!(error = %e, "socket not open, typing signal dropped");
        }
    }

    /// Tell the server this conversation has been read.
    pub fn mark_read(&self) {
        let Destination::Conversation(conversation_id) = self.destination.lock().unwrap().clone()
        else {
            return;
        };
        if let Err(e) = self.realtime.send(ClientEvent::Read { conversation_id }) {
            warn!(error = %e, "socket not open, read receipt dropped");
        }
    }

    /// Whether the other party is currently typing.
    pub fn peer_typing(&self) -> bool {
        let Destination::Conversation(conversation_id) = self.destination.lock().unwrap().clone()
        else {
            return false;
        };
        self.typing.lock().unwrap().is_typing(&conversation_id, Instant::now())
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.realtime.unsubscribe(id);
        }
    }
}

// ---------------------------------------------------------------------------
// RosterSession
// ---------------------------------------------------------------------------

/// The conversation list, kept current from socket broadcasts.
pub struct RosterSession {
    api: ApiClient,
    realtime: RealtimeClient,
    self_id: String,
    roster: Arc<Mutex<ConversationRoster>>,
    needs_refresh: Arc<std::sync::atomic::AtomicBool>,
    subscriptions: Vec<SubscriptionId>,
}

impl RosterSession {
    pub async fn open(
        api: ApiClient,
        realtime: RealtimeClient,
        session: &SessionHandle,
    ) -> courier_common::Result<Self> {
        let self_id = signed_in_user(session)?;
        let conversations = api.conversations(&self_id).await.map_err(api_err)?;

        let roster = Arc::new(Mutex::new(ConversationRoster::new(&self_id)));
        roster.lock().unwrap().set_conversations(conversations);

        let needs_refresh = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let mut subscriptions = Vec::new();

        {
            let roster = roster.clone();
            let needs_refresh = needs_refresh.clone();
            subscriptions.push(realtime.subscribe(EventKind::NewMessage, move |event| {
                if let ServerEvent::NewMessage { message } = event {
                    let change = roster.lock().unwrap().note_message(message);
                    if change == RosterChange::Unknown {
                        // A conversation we have never seen; only a
                        // refetch can fill in its metadata.
                        needs_refresh.store(true, std::sync::atomic::Ordering::SeqCst);
                    }
                }
            }));
        }
        {
            let roster = roster.clone();
            subscriptions.push(realtime.subscribe(EventKind::StatusChange, move |event| {
                if let ServerEvent::StatusChange { user_id, status } = event {
                    roster.lock().unwrap().apply_presence(user_id, *status);
                }
            }));
        }

        Ok(Self { api, realtime, self_id, roster, needs_refresh, subscriptions })
    }

    pub fn roster(&self) -> &Arc<Mutex<ConversationRoster>> {
        &self.roster
    }

    /// Make a conversation the active view: clears its unread counter
    /// and sends the read receipt.
    pub fn set_active(&self, conversation_id: Option<&str>) {
        self.roster.lock().unwrap().set_active(conversation_id);
        if let Some(conversation_id) = conversation_id {
            let event = ClientEvent::Read { conversation_id: conversation_id.into() };
            if let Err(e) = self.realtime.send(event) {
                warn!(error = %e, "socket not open, read receipt dropped");
            }
        }
    }

    /// Whether a broadcast referenced a conversation missing from the
    /// list since the last refresh.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Refetch the list from REST.
    pub async fn refresh(&self) -> courier_common::Result<()> {
        let conversations = self.api.conversations(&self.self_id).await.map_err(api_err)?;
        self.roster.lock().unwrap().set_conversations(conversations);
        self.needs_refresh.store(false, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for RosterSession {
    fn drop(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.realtime.unsubscribe(id);
        }
    }
}

fn signed_in_user(session: &SessionHandle) -> courier_common::Result<String> {
    session
        .user_id()
        .ok_or_else(|| CourierError::Session("not signed in".into()))
}
