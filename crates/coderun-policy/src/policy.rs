//! The response-policy seam between session lifecycle and program behavior.

use coderun_core::{PromptKind, Result, SessionState};

/// What a program does after answering a line of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextState {
    /// The program pauses on another read
    AwaitInput,
    /// The program exits
    Finish,
}

impl NextState {
    /// Session state the program moves into.
    pub fn state(&self) -> SessionState {
        match self {
            NextState::AwaitInput => SessionState::WaitingForInput,
            NextState::Finish => SessionState::Finished,
        }
    }

    /// Whether the program exits.
    pub fn is_finished(&self) -> bool {
        matches!(self, NextState::Finish)
    }
}

/// A program's answer to one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Output chunk produced while handling the line
    pub chunk: String,
    /// State after the chunk was produced
    pub next: NextState,
}

impl Response {
    /// A final chunk after which the program exits.
    pub fn finish(chunk: impl Into<String>) -> Self {
        Self {
            chunk: chunk.into(),
            next: NextState::Finish,
        }
    }

    /// A chunk after which the program pauses for more input.
    pub fn await_input(chunk: impl Into<String>) -> Self {
        Self {
            chunk: chunk.into(),
            next: NextState::AwaitInput,
        }
    }
}

/// Behavior of a submitted program.
///
/// Implementations must be pure functions of their arguments. The session
/// layer owns all state; a real build-and-run backend can replace the
/// pattern catalog without touching session lifecycle code.
pub trait ResponsePolicy: Send + Sync {
    /// Policy name for debugging/logging.
    fn name(&self) -> &'static str;

    /// Detect what kind of interactive read the program performs.
    fn classify(&self, source: &str) -> PromptKind;

    /// Build the program and produce its output up to the first read.
    ///
    /// For a non-interactive program this is the full output. Fails with
    /// [`coderun_core::Error::CompilationFailed`] when the source does not build.
    fn launch(&self, source: &str, kind: PromptKind) -> Result<String>;

    /// Answer one line of input delivered to a paused program.
    fn respond(&self, source: &str, kind: PromptKind, line: &str) -> Response;
}
