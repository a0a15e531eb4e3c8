//! Session types shared by every layer.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Unique identifier for a run session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for SessionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| Error::InvalidSessionId(s.to_string()))
    }
}

/// Lifecycle state of a run session.
///
/// Every input delivery moves a session `WaitingForInput -> Busy` and then to
/// either `WaitingForInput` again or `Finished`. `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// The program is paused on a read and accepts one line of input
    WaitingForInput,
    /// An input line is being processed
    Busy,
    /// The program has exited; no more input is accepted
    Finished,
}

impl SessionState {
    /// Whether a line of input may be delivered in this state.
    pub fn accepts_input(&self) -> bool {
        matches!(self, SessionState::WaitingForInput)
    }

    /// Whether this is the terminal state.
    pub fn is_finished(&self) -> bool {
        matches!(self, SessionState::Finished)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::WaitingForInput => "waiting for input",
            SessionState::Busy => "busy",
            SessionState::Finished => "finished",
        };
        f.write_str(s)
    }
}

/// Category of interactive read detected in a program's source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// The program never reads input
    None,
    /// The program asks for a name
    Name,
    /// The program extracts formatted values, e.g. a pair of numbers
    Value,
    /// The program reads input with no recognizable prompt
    Generic,
}

impl PromptKind {
    /// Whether a program of this kind pauses for input.
    pub fn is_interactive(&self) -> bool {
        !matches!(self, PromptKind::None)
    }
}
