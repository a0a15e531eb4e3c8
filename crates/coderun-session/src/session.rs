//! Run session state.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

use coderun_core::{Error, PromptKind, Result, SessionId, SessionState};

use crate::output::OutputLog;

/// One build-and-run attempt.
///
/// Sessions live inside the [`SessionStore`](crate::SessionStore); every
/// state transition happens through the store's `mutate`, which serializes
/// concurrent callers.
#[derive(Debug, Clone)]
pub struct Session {
    /// Session identifier
    id: SessionId,

    /// Submitted source, immutable for the session's lifetime
    source: Arc<str>,

    /// Interactive read detected in the source
    prompt_kind: PromptKind,

    /// Output produced so far
    output: OutputLog,

    /// Current lifecycle state
    state: SessionState,

    /// Wall-clock creation time (for reporting)
    created_at: DateTime<Utc>,

    /// Monotonic creation time
    started: Instant,

    /// Last time the session changed state
    last_activity: Instant,

    /// When the session reached `Finished`
    finished_at: Option<Instant>,
}

impl Session {
    /// Create a new session waiting for input.
    pub fn new(id: SessionId, source: impl Into<Arc<str>>, prompt_kind: PromptKind) -> Self {
        let now = Instant::now();
        Self {
            id,
            source: source.into(),
            prompt_kind,
            output: OutputLog::new(),
            state: SessionState::WaitingForInput,
            created_at: Utc::now(),
            started: now,
            last_activity: now,
            finished_at: None,
        }
    }

    /// Get the session ID.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Get the submitted source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Shared handle to the submitted source.
    pub fn source_arc(&self) -> Arc<str> {
        Arc::clone(&self.source)
    }

    /// Get the detected prompt kind.
    pub fn prompt_kind(&self) -> PromptKind {
        self.prompt_kind
    }

    /// Whether the program reads input at all.
    pub fn is_interactive(&self) -> bool {
        self.prompt_kind.is_interactive()
    }

    /// Get the output log.
    pub fn output(&self) -> &OutputLog {
        &self.output
    }

    /// Get the current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Get the wall-clock creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time the session reached `Finished`, if it has.
    pub fn finished_at(&self) -> Option<Instant> {
        self.finished_at
    }

    /// Append a chunk of program output.
    pub fn append_output(&mut self, chunk: impl Into<String>) {
        self.output.append(chunk);
    }

    /// Claim the session for one line of input (`WaitingForInput -> Busy`).
    pub fn begin_input(&mut self) -> Result<()> {
        if !self.state.accepts_input() {
            return Err(Error::NotWaiting {
                id: self.id,
                state: self.state,
            });
        }
        self.set_state(SessionState::Busy, Instant::now());
        Ok(())
    }

    /// Record the answer to the line claimed by [`begin_input`](Self::begin_input).
    ///
    /// Returns `false` without touching the session if it is no longer busy,
    /// which happens when it was stopped while the line was in flight.
    pub fn complete_input(
        &mut self,
        chunk: impl Into<String>,
        next: SessionState,
        now: Instant,
    ) -> bool {
        if self.state != SessionState::Busy {
            debug!(
                "Dropping response for session {} in state {:?}",
                self.id, self.state
            );
            return false;
        }
        self.output.append(chunk);
        match next {
            SessionState::Finished => self.finish(now),
            // Busy is never a resting state
            SessionState::WaitingForInput | SessionState::Busy => {
                self.set_state(SessionState::WaitingForInput, now)
            }
        }
        true
    }

    /// Give back a claim whose line was never answered (`Busy -> WaitingForInput`).
    ///
    /// Returns `false` if the session is not busy.
    pub fn release_input(&mut self, now: Instant) -> bool {
        if self.state != SessionState::Busy {
            return false;
        }
        self.set_state(SessionState::WaitingForInput, now);
        true
    }

    /// Move to `Finished` at `now`.
    pub fn finish(&mut self, now: Instant) {
        if self.state.is_finished() {
            return;
        }
        self.set_state(SessionState::Finished, now);
        self.finished_at = Some(now);
    }

    /// Stop the program, whatever it is doing.
    ///
    /// Returns `false` if it had already finished.
    pub fn force_finish(&mut self, now: Instant) -> bool {
        if self.state.is_finished() {
            return false;
        }
        info!("Force-finishing session {} (was {:?})", self.id, self.state);
        self.finish(now);
        true
    }

    /// Whether the session finished at least `grace_period` before `now`.
    pub fn is_expirable(&self, now: Instant, grace_period: Duration) -> bool {
        match (self.state, self.finished_at) {
            (SessionState::Finished, Some(at)) => {
                now.saturating_duration_since(at) >= grace_period
            }
            _ => false,
        }
    }

    /// Whether the session has waited for input for at least `timeout`.
    pub fn is_idle(&self, now: Instant, timeout: Duration) -> bool {
        self.state == SessionState::WaitingForInput
            && now.saturating_duration_since(self.last_activity) >= timeout
    }

    /// Read-only view of the session at `now`.
    pub fn snapshot(&self, now: Instant) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            state: self.state,
            prompt_kind: self.prompt_kind,
            interactive: self.is_interactive(),
            chunks: self.output.len(),
            transcript: self.output.transcript(),
            created_at: self.created_at,
            age: now.saturating_duration_since(self.started),
        }
    }

    fn set_state(&mut self, state: SessionState, now: Instant) {
        debug!(
            "Session state changed: id={}, {:?} → {:?}",
            self.id, self.state, state
        );
        self.state = state;
        self.last_activity = now;
    }
}

/// Read-only view of a session for callers outside the store.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    /// Session identifier
    pub session_id: SessionId,
    /// Current state
    pub state: SessionState,
    /// Detected prompt kind
    pub prompt_kind: PromptKind,
    /// Whether the program reads input
    pub interactive: bool,
    /// Number of output chunks
    pub chunks: usize,
    /// Full output transcript
    pub transcript: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Time since creation
    pub age: Duration,
}
