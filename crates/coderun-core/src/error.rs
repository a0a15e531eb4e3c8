//! Error types for coderun.

use thiserror::Error;

use crate::{SessionId, SessionState};

/// Main error type for coderun operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Session not found (never existed, or already expired)
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// Input delivered to a session that is not paused on a read
    #[error("Session {id} is not waiting for input (state: {state})")]
    NotWaiting {
        /// Session that rejected the input
        id: SessionId,
        /// State the session was in
        state: SessionState,
    },

    /// No free session identifier could be allocated
    #[error("Session identifier space exhausted after {attempts} attempts")]
    IdentifierExhaustion {
        /// Number of allocation attempts made
        attempts: usize,
    },

    /// The submitted source failed to build
    #[error("{0}")]
    CompilationFailed(String),

    /// Session ID string could not be parsed
    #[error("Invalid session ID: {0}")]
    InvalidSessionId(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the caller can carry on after this error.
    ///
    /// Unknown or non-waiting sessions only mean the caller should stop
    /// offering input; identifier exhaustion is fatal.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::IdentifierExhaustion { .. })
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
