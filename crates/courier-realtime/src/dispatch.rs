//! Tag-keyed subscriber dispatch.
//!
//! Subscribers register a callback under one event tag and get back an id
//! they can later pass to `unsubscribe` (idempotent). Callbacks for a tag
//! run in registration order. Dispatch clones the callback list out of the
//! lock first, so a callback may itself subscribe or unsubscribe.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::protocol::{EventKind, ServerEvent};

/// Opaque handle returned by [`Dispatcher::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(&ServerEvent) + Send + Sync>;

#[derive(Default)]
struct Table {
    next_id: u64,
    subscribers: HashMap<EventKind, Vec<(SubscriptionId, Callback)>>,
}

/// Routes parsed inbound events to registered subscribers.
#[derive(Default)]
pub struct Dispatcher {
    table: Mutex<Table>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for one event tag.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&ServerEvent) + Send + Sync + 'static,
    {
        let mut table = self.table.lock().unwrap();
        let id = SubscriptionId(table.next_id);
        table.next_id += 1;
        table
            .subscribers
            .entry(kind)
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscription. Unknown or already-removed ids are a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut table = self.table.lock().unwrap();
        for subs in table.subscribers.values_mut() {
            subs.retain(|(sub_id, _)| *sub_id != id);
        }
    }

    /// Invoke every subscriber registered for the event's tag, in
    /// registration order.
    pub fn dispatch(&self, event: &ServerEvent) {
        let callbacks: Vec<Callback> = {
            let table = self.table.lock().unwrap();
            table
                .subscribers
                .get(&event.kind())
                .map(|subs| subs.iter().map(|(_, cb)| Arc::clone(cb)).collect())
                .unwrap_or_default()
        };
        for callback in callbacks {
            callback(event);
        }
    }

    /// Number of live subscriptions for a tag.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.table
            .lock()
            .unwrap()
            .subscribers
            .get(&kind)
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn typing_event(conversation_id: &str) -> ServerEvent {
        ServerEvent::UserTyping { conversation_id: conversation_id.into() }
    }

    #[test]
    fn dispatches_only_matching_tag() {
        let dispatcher = Dispatcher::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = Arc::clone(&hits);
        dispatcher.subscribe(EventKind::UserTyping, move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.dispatch(&typing_event("conv1"));
        dispatcher.dispatch(&ServerEvent::MessageDeleted { message_id: "m1".into() });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscribers_run_in_registration_order() {
        let dispatcher = Dispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            dispatcher.subscribe(EventKind::UserTyping, move |_| {
                order.lock().unwrap().push(label);
            });
        }

        dispatcher.dispatch(&typing_event("conv1"));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let dispatcher = Dispatcher::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = Arc::clone(&hits);
        let id = dispatcher.subscribe(EventKind::UserTyping, move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.dispatch(&typing_event("conv1"));
        dispatcher.unsubscribe(id);
        dispatcher.unsubscribe(id);
        dispatcher.dispatch(&typing_event("conv1"));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.subscriber_count(EventKind::UserTyping), 0);
    }

    #[test]
    fn unsubscribe_removes_exactly_one_callback() {
        let dispatcher = Dispatcher::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let a = Arc::clone(&hits);
        let id_a = dispatcher.subscribe(EventKind::UserTyping, move |_| {
            a.fetch_add(1, Ordering::SeqCst);
        });
        let b = Arc::clone(&hits);
        let _id_b = dispatcher.subscribe(EventKind::UserTyping, move |_| {
            b.fetch_add(10, Ordering::SeqCst);
        });

        dispatcher.unsubscribe(id_a);
        dispatcher.dispatch(&typing_event("conv1"));
        assert_eq!(hits.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn callback_may_unsubscribe_itself() {
        let dispatcher = Arc::new(Dispatcher::new());
        let hits = Arc::new(AtomicUsize::new(0));

        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));
        let dispatcher_clone = Arc::clone(&dispatcher);
        let slot_clone = Arc::clone(&slot);
        let hits_clone = Arc::clone(&hits);
        let id = dispatcher.subscribe(EventKind::UserTyping, move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *slot_clone.lock().unwrap() {
                dispatcher_clone.unsubscribe(id);
            }
        });
        *slot.lock().unwrap() = Some(id);

        dispatcher.dispatch(&typing_event("conv1"));
        dispatcher.dispatch(&typing_event("conv1"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
