//! Shared authenticated-session handle.
//!
//! Both the REST client (on a 401) and the realtime connection (on close
//! codes 4001/4003) invalidate the session; the latch guarantees the
//! forced-logout side effect fires exactly once per credential.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::watch;
use tracing::info;

use crate::models::UserProfile;

struct SessionInner {
    token: RwLock<Option<String>>,
    user: RwLock<Option<UserProfile>>,
    invalidated: AtomicBool,
    expired_tx: watch::Sender<bool>,
}

/// Cloneable handle to the current authenticated session.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

impl SessionHandle {
    pub fn new() -> Self {
        let (expired_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(SessionInner {
                token: RwLock::new(None),
                user: RwLock::new(None),
                invalidated: AtomicBool::new(false),
                expired_tx,
            }),
        }
    }

    /// Store a fresh credential, re-arming the invalidation latch.
    pub fn authenticate(&self, user: UserProfile, token: String) {
        *self.inner.token.write().unwrap() = Some(token);
        *self.inner.user.write().unwrap() = Some(user);
        self.inner.invalidated.store(false, Ordering::SeqCst);
        let _ = self.inner.expired_tx.send(false);
    }

    /// Intentionally clear the credential (user-initiated logout).
    pub fn clear(&self) {
        *self.inner.token.write().unwrap() = None;
        *self.inner.user.write().unwrap() = None;
    }

    pub fn token(&self) -> Option<String> {
        self.inner.token.read().unwrap().clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.inner.user.read().unwrap().clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.inner.user.read().unwrap().as_ref().map(|u| u.id.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.token.read().unwrap().is_some()
            && !self.inner.invalidated.load(Ordering::SeqCst)
    }

    /// Invalidate the session (server rejected the credential).
    ///
    /// Returns true only for the first call per credential; callers use the
    /// return value to trigger forced logout exactly once.
    pub fn invalidate(&self) -> bool {
        let first = !self.inner.invalidated.swap(true, Ordering::SeqCst);
        if first {
            info!("session invalidated, forcing logout");
            *self.inner.token.write().unwrap() = None;
            let _ = self.inner.expired_tx.send(true);
        }
        first
    }

    /// Watch receiver that flips to true when the session is invalidated.
    pub fn expired(&self) -> watch::Receiver<bool> {
        self.inner.expired_tx.subscribe()
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str) -> UserProfile {
        UserProfile {
            id: id.into(),
            email: None,
            tel: None,
            name: None,
            bio: None,
            username: None,
            avatar: None,
            status: None,
        }
    }

    #[test]
    fn authenticate_stores_token_and_user() {
        let session = SessionHandle::new();
        assert!(!session.is_authenticated());

        session.authenticate(profile("u1"), "tok".into());
        assert!(session.is_authenticated());
        assert_eq!(session.token().as_deref(), Some("tok"));
        assert_eq!(session.user_id().as_deref(), Some("u1"));
    }

    #[test]
    fn invalidate_fires_exactly_once() {
        let session = SessionHandle::new();
        session.authenticate(profile("u1"), "tok".into());

        assert!(session.invalidate());
        assert!(!session.invalidate());
        assert!(session.token().is_none());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn reauthenticate_rearms_the_latch() {
        let session = SessionHandle::new();
        session.authenticate(profile("u1"), "tok".into());
        assert!(session.invalidate());

        session.authenticate(profile("u1"), "tok2".into());
        assert!(session.is_authenticated());
        assert!(session.invalidate());
    }

    #[test]
    fn expired_watch_observes_invalidation() {
        let session = SessionHandle::new();
        session.authenticate(profile("u1"), "tok".into());
        let rx = session.expired();
        assert!(!*rx.borrow());

        session.invalidate();
        assert!(*rx.borrow());
    }

    #[test]
    fn clear_is_quiet() {
        let session = SessionHandle::new();
        session.authenticate(profile("u1"), "tok".into());
        let rx = session.expired();

        session.clear();
        assert!(session.token().is_none());
        assert!(!*rx.borrow());
    }
}
