//! MCP Tool Types
//!
//! Parameter and response types for every MCP tool the server exposes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use coderun_core::{PromptKind, SessionState};
use coderun_session::{InputOutcome, SessionSnapshot, StartOutcome};

// =============================================================================
// Run Tools
// =============================================================================

/// Parameters for run_start
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunStartParams {
    /// Program source to build and run
    pub source: String,
}

/// Response for run_start
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunStartResponse {
    /// Output up to the first read, or the full output of a batch program
    pub output: String,

    /// Session to send input to (empty when the program does not read input)
    pub session_id: String,

    /// Whether the program is waiting for input
    pub interactive: bool,

    /// Session state after start
    pub state: SessionState,
}

impl From<StartOutcome> for RunStartResponse {
    fn from(outcome: StartOutcome) -> Self {
        let state = if outcome.interactive {
            SessionState::WaitingForInput
        } else {
            SessionState::Finished
        };
        Self {
            output: outcome.output,
            session_id: outcome
                .session_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            interactive: outcome.interactive,
            state,
        }
    }
}

/// Parameters for run_send_line
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunSendLineParams {
    /// Session ID returned by run_start
    pub session_id: String,

    /// One line of input, without the trailing newline
    pub line: String,
}

/// Response for run_send_line
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunSendLineResponse {
    /// Output produced in answer to the line
    pub output_chunk: String,

    /// Whether the program has exited
    pub finished: bool,

    /// Session state after the line was handled
    pub state: SessionState,
}

impl From<InputOutcome> for RunSendLineResponse {
    fn from(outcome: InputOutcome) -> Self {
        Self {
            output_chunk: outcome.chunk,
            finished: outcome.finished,
            state: outcome.state,
        }
    }
}

/// Parameters for run_stop
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunStopParams {
    /// Session ID to stop
    pub session_id: String,
}

/// Response for run_stop
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunStopResponse {
    /// Session ID
    pub session_id: String,

    /// Whether a running program was stopped (false if it had already finished or expired)
    pub stopped: bool,

    /// Status message
    pub message: String,
}

// =============================================================================
// Session Inspection Tools
// =============================================================================

/// Parameters for run_session_get
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionGetParams {
    /// Session ID
    pub session_id: String,

    /// Only return output chunks after this many (for incremental reads)
    #[serde(default)]
    pub since: Option<usize>,
}

/// Response for run_session_get
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionGetResponse {
    /// Session summary
    pub session: SessionInfo,

    /// Output chunks, starting at `since` when given
    pub output: Vec<String>,

    /// Full transcript, chunks joined by newlines
    pub transcript: String,
}

/// Parameters for run_session_list
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionListParams {}

/// Response for run_session_list
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionListResponse {
    /// Live sessions, oldest first
    pub sessions: Vec<SessionInfo>,

    /// Number of live sessions
    pub count: usize,
}

/// Session summary
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionInfo {
    /// Session ID
    pub session_id: String,

    /// Current state
    pub state: SessionState,

    /// Detected prompt kind
    pub prompt_kind: PromptKind,

    /// Whether the program reads input
    pub interactive: bool,

    /// Number of output chunks recorded
    pub chunks: usize,

    /// Creation time (RFC 3339)
    pub created_at: String,

    /// Session age in seconds
    pub age_seconds: u64,
}

impl From<&SessionSnapshot> for SessionInfo {
    fn from(snapshot: &SessionSnapshot) -> Self {
        Self {
            session_id: snapshot.session_id.to_string(),
            state: snapshot.state,
            prompt_kind: snapshot.prompt_kind,
            interactive: snapshot.interactive,
            chunks: snapshot.chunks,
            created_at: snapshot.created_at.to_rfc3339(),
            age_seconds: snapshot.age.as_secs(),
        }
    }
}
