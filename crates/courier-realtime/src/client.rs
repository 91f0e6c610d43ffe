//! Public handle over the background connection loop.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use courier_common::{RealtimeError, SessionHandle};

use crate::connection::connection_loop;
use crate::dispatch::{Dispatcher, SubscriptionId};
use crate::protocol::{ClientEvent, EventKind, ServerEvent};
use crate::types::{ConnectionState, RealtimeConfig};

/// Channels into a live connection loop.
struct Link {
    outbound_tx: mpsc::Sender<ClientEvent>,
    shutdown_tx: mpsc::Sender<()>,
}

/// Realtime chat client.
///
/// Owns the dispatcher and the background connection task. Cloneable;
/// all clones share one socket.
#[derive(Clone)]
pub struct RealtimeClient {
    config: RealtimeConfig,
    session: SessionHandle,
    dispatcher: Arc<Dispatcher>,
    status: Arc<Mutex<ConnectionState>>,
    link: Arc<Mutex<Option<Link>>>,
}

impl RealtimeClient {
    pub fn new(config: RealtimeConfig, session: SessionHandle) -> Self {
        Self {
            config,
            session,
            dispatcher: Arc::new(Dispatcher::new()),
            status: Arc::new(Mutex::new(ConnectionState::Disconnected)),
            link: Arc::new(Mutex::new(None)),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.status.lock().unwrap()
    }

    /// Open the socket and start the reconnect loop.
    ///
    /// A no-op when a connection loop is already running, or when the
    /// session holds no credential.
    pub fn connect(&self) {
        let Some(token) = self.session.token() else {
            tracing::warn!("connect called without a credential, ignoring");
            return;
        };

        let mut link = self.link.lock().unwrap();
        if link.is_some() && self.state().is_active() {
            tracing::debug!("connect called while already active, ignoring");
            return;
        }

        let (outbound_tx, outbound_rx) = mpsc::channel(64);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        *link = Some(Link {
            outbound_tx,
            shutdown_tx,
        });

        tokio::spawn(connection_loop(
            self.config.clone(),
            token,
            self.status.clone(),
            self.dispatcher.clone(),
            self.session.clone(),
            outbound_rx,
            shutdown_rx,
        ));
    }

    /// Tear the connection down, cancelling any pending reconnect.
    pub fn disconnect(&self) {
        let link = self.link.lock().unwrap().take();
        if let Some(link) = link {
            // The loop may already have exited; a closed channel is fine.
            let _ = link.shutdown_tx.try_send(());
        }
    }

    /// Hand an event to the socket.
    ///
    /// Fails when the socket is not open. There is no offline queue: a
    /// frame that cannot go out now is dropped, including during the
    /// reconnect window.
    pub fn send(&self, event: ClientEvent) -> courier_common::Result<()> {
        if !self.state().is_connected() {
            return Err(RealtimeError::NotConnected.into());
        }
        let link = self.link.lock().unwrap();
        let Some(link) = link.as_ref() else {
            return Err(RealtimeError::NotConnected.into());
        };
        link.outbound_tx
            .try_send(event)
            .map_err(|_| RealtimeError::NotConnected)?;
        Ok(())
    }

    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&ServerEvent) + Send + Sync + 'static,
    {
        self.dispatcher.subscribe(kind, callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.dispatcher.unsubscribe(id);
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}
