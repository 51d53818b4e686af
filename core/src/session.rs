//! Authenticated session state.
//!
//! A `Session` is saved after a successful login and cleared on logout. It
//! lives in a `SessionStore` owned by a `SessionManager`; nothing else in the
//! crate reads or writes it.

use std::fmt;
use std::sync::RwLock;

use tracing::debug;

use crate::http::AUTHORIZATION;
use crate::role::Role;

#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub role: Option<Role>,
}

impl Session {
    pub fn new(token: impl Into<String>, role: Option<Role>) -> Self {
        Self {
            token: token.into(),
            role,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Backing storage for the current session.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Option<Session>;
    fn save(&self, session: Session);
    fn clear(&self);
}

/// Process-local store. Poisoned locks are recovered since the stored value
/// is replaced wholesale on every write.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    current: RwLock<Option<Session>>,
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn save(&self, session: Session) {
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session);
    }

    fn clear(&self) {
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

#[derive(Debug, Default)]
pub struct SessionManager<S = MemorySessionStore> {
    store: S,
}

impl<S: SessionStore> SessionManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Option<Session> {
        self.store.load()
    }

    pub fn save(&self, session: Session) {
        debug!(role = ?session.role, "saving session");
        self.store.save(session);
    }

    pub fn clear(&self) {
        debug!("clearing session");
        self.store.clear();
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.load().is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.store.load().and_then(|session| session.role)
    }

    /// `Authorization: Bearer <token>` for the current session, if any.
    pub fn bearer_header(&self) -> Option<(String, String)> {
        self.store
            .load()
            .map(|session| (AUTHORIZATION.to_string(), format!("Bearer {}", session.token)))
    }
}
