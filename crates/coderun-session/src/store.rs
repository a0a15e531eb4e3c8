//! Session store: the only owner of session state.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use coderun_core::{Error, PromptKind, Result, SessionId};

use crate::session::Session;

/// How many fresh identifiers `create` tries before giving up.
const MAX_ID_ATTEMPTS: usize = 8;

type IdGenerator = Arc<dyn Fn() -> SessionId + Send + Sync>;

/// Registry mapping session identifiers to sessions.
///
/// Sessions never leave the store; callers get clones or run closures
/// against them through [`mutate`](Self::mutate), which holds the store lock
/// for the whole read-modify-write.
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
    next_id: IdGenerator,
}

impl SessionStore {
    /// Create an empty store issuing random identifiers.
    pub fn new() -> Self {
        Self::with_id_generator(Arc::new(SessionId::new))
    }

    /// Create an empty store with a custom identifier source.
    pub fn with_id_generator(next_id: IdGenerator) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_id,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionId, Session>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, Session>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new session waiting for input and return its identifier.
    ///
    /// Fails with [`Error::IdentifierExhaustion`] if no unused identifier
    /// turns up after a bounded number of attempts.
    pub fn create(&self, source: impl Into<Arc<str>>, prompt_kind: PromptKind) -> Result<SessionId> {
        let source = source.into();
        let mut sessions = self.write();

        for attempt in 1..=MAX_ID_ATTEMPTS {
            let id = (self.next_id)();
            if sessions.contains_key(&id) {
                warn!("Session id collision on attempt {}: {}", attempt, id);
                continue;
            }

            sessions.insert(id, Session::new(id, source, prompt_kind));
            info!(
                "Session created: id={}, prompt_kind={:?}, live={}",
                id,
                prompt_kind,
                sessions.len()
            );
            return Ok(id);
        }

        Err(Error::IdentifierExhaustion {
            attempts: MAX_ID_ATTEMPTS,
        })
    }

    /// Get a copy of a session by ID.
    pub fn get(&self, id: &SessionId) -> Result<Session> {
        self.read()
            .get(id)
            .cloned()
            .ok_or(Error::SessionNotFound(*id))
    }

    /// Apply an atomic read-modify-write to a session.
    ///
    /// The closure runs under the store's write lock, so no other caller can
    /// observe or change the session until it returns.
    pub fn mutate<T, F>(&self, id: &SessionId, f: F) -> Result<T>
    where
        F: FnOnce(&mut Session) -> Result<T>,
    {
        let mut sessions = self.write();
        let session = sessions.get_mut(id).ok_or(Error::SessionNotFound(*id))?;
        f(session)
    }

    /// Remove a session. Removing an absent ID is a no-op.
    ///
    /// Returns whether a session was removed.
    pub fn remove(&self, id: &SessionId) -> bool {
        let removed = self.write().remove(id).is_some();
        if removed {
            info!("Session removed: id={}", id);
        } else {
            debug!("Session already absent: id={}", id);
        }
        removed
    }

    /// IDs of sessions that finished at least `grace_period` before `now`.
    pub fn list_expirable(&self, now: Instant, grace_period: Duration) -> Vec<SessionId> {
        self.read()
            .values()
            .filter(|s| s.is_expirable(now, grace_period))
            .map(|s| *s.id())
            .collect()
    }

    /// IDs of sessions that have waited for input for at least `timeout`.
    pub fn list_idle(&self, now: Instant, timeout: Duration) -> Vec<SessionId> {
        self.read()
            .values()
            .filter(|s| s.is_idle(now, timeout))
            .map(|s| *s.id())
            .collect()
    }

    /// Copies of all live sessions.
    pub fn list(&self) -> Vec<Session> {
        self.read().values().cloned().collect()
    }

    /// Get the number of live sessions.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Remove every session.
    pub fn clear(&self) {
        let mut sessions = self.write();
        let count = sessions.len();
        sessions.clear();
        info!("Session store cleared: {} session(s) dropped", count);
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.len())
            .finish_non_exhaustive()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
