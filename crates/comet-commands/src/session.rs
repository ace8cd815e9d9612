//! Interactive sessions, at most one per conversation scope

use comet_common::{CometError, Result, Scope};
use dashmap::{mapref::entry::Entry, DashMap};
use parking_lot::Mutex;
use std::{any::Any, sync::Arc, time::Duration};
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// How a session interacts with new command invocations in its scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Unprefixed messages are consumed by the session
    Exclusive,
    /// Unprefixed messages are seen by the session and dispatch continues
    Daemon,
}

/// Live state of one multi-turn interaction
pub struct Session {
    id: Uuid,
    scope: Scope,
    command: String,
    kind: SessionKind,
    created_at: Instant,
    last_active: Mutex<Instant>,
    payload: tokio::sync::Mutex<Box<dyn Any + Send + Sync>>,
}

impl Session {
    /// New session in `scope` owned by the command named `command`
    pub fn new<T>(scope: Scope, command: impl Into<String>, kind: SessionKind, payload: T) -> Self
    where
        T: Any + Send + Sync,
    {
        let now = Instant::now();
        Self {
            id: Uuid::new_v4(),
            scope,
            command: command.into(),
            kind,
            created_at: now,
            last_active: Mutex::new(now),
            payload: tokio::sync::Mutex::new(Box::new(payload)),
        }
    }

    /// Session id, used in logs
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Scope the session is bound to
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Name of the owning command
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Session kind
    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    /// Whether this is a daemon session
    pub fn is_daemon(&self) -> bool {
        self.kind == SessionKind::Daemon
    }

    /// When the session was created
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Time since the session was created
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Last time input reached the session
    pub fn last_active(&self) -> Instant {
        *self.last_active.lock()
    }

    /// Mark the session as active now
    pub fn touch(&self) {
        *self.last_active.lock() = Instant::now();
    }

    /// Run `f` on the payload if it is a `T`. Calls are serialized per session.
    pub async fn with_payload<T, R, F>(&self, f: F) -> Option<R>
    where
        T: Any + Send + Sync,
        F: FnOnce(&mut T) -> R,
    {
        let mut payload = self.payload.lock().await;
        payload.downcast_mut::<T>().map(f)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("command", &self.command)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// All live sessions, keyed by scope
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<Scope, Arc<Session>>,
}

impl SessionRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `session` for its scope.
    ///
    /// Fails with [`CometError::SessionConflict`] if the scope already has a
    /// session; the existing one is left untouched.
    pub fn create(&self, session: Session) -> Result<Arc<Session>> {
        match self.sessions.entry(session.scope()) {
            Entry::Occupied(_) => Err(CometError::session_conflict(session.scope())),
            Entry::Vacant(entry) => {
                let session = Arc::new(session);
                entry.insert(Arc::clone(&session));
                info!(
                    session = %session.id(),
                    scope = %session.scope(),
                    command = session.command(),
                    "Session started"
                );
                Ok(session)
            }
        }
    }

    /// Active session of `scope`
    pub fn get(&self, scope: Scope) -> Option<Arc<Session>> {
        self.sessions.get(&scope).map(|entry| Arc::clone(entry.value()))
    }

    /// Whether `scope` has an active session
    pub fn contains(&self, scope: Scope) -> bool {
        self.sessions.contains_key(&scope)
    }

    /// Remove `session` if it is still the active session of its scope.
    ///
    /// Returns whether it was removed. A stale handle never removes a newer session.
    pub fn expire(&self, session: &Arc<Session>) -> bool {
        let removed = self
            .sessions
            .remove_if(&session.scope(), |_, current| Arc::ptr_eq(current, session))
            .is_some();
        if removed {
            info!(
                session = %session.id(),
                scope = %session.scope(),
                lifetime_ms = session.age().as_millis() as u64,
                "Session expired"
            );
        } else {
            debug!(session = %session.id(), "Expire ignored for inactive session");
        }
        removed
    }

    /// Mark the session of `scope` as active now
    pub fn touch(&self, scope: Scope) {
        if let Some(session) = self.sessions.get(&scope) {
            session.touch();
        }
    }

    /// Number of active sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is active
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
