//! CodeRun MCP Server Implementation
//!
//! This module implements the MCP server using rmcp 0.9's #[tool_router] pattern.
//! It routes MCP tool calls to the session service.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router, ErrorData as McpError,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use coderun_core::{Error, SessionId};
use coderun_session::SessionService;

use crate::tools::*;

/// Map a service error to a JSON-RPC error.
///
/// Anything the caller can fix by changing its request is invalid params;
/// the rest is internal.
pub fn to_mcp_error(err: Error) -> McpError {
    let code = match &err {
        Error::SessionNotFound(_)
        | Error::NotWaiting { .. }
        | Error::InvalidSessionId(_)
        | Error::CompilationFailed(_) => ErrorCode(-32602), // Invalid params
        _ => {
            error!("Internal error: {}", err);
            ErrorCode(-32603) // Internal error
        }
    };
    McpError::new(code, err.to_string(), None)
}

fn parse_session_id(session_id: &str) -> Result<SessionId, McpError> {
    session_id.parse().map_err(|e: Error| {
        warn!("Invalid session ID format: {}", session_id);
        to_mcp_error(e)
    })
}

fn json_result<T: Serialize>(response: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(response).map_err(|e| {
        McpError::new(
            ErrorCode(-32603),
            format!("Failed to serialize response: {e}"),
            None,
        )
    })?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// CodeRun MCP Server
///
/// Exposes interactive build-and-run sessions via MCP tools.
#[derive(Clone)]
pub struct CodeRunMcpServer {
    /// Session service shared with the background sweeper
    service: Arc<SessionService>,
    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl CodeRunMcpServer {
    /// Create a new server over a session service
    pub fn new(service: Arc<SessionService>) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }

    /// Build a program and run it until it first reads input
    #[tool(
        description = "Build and run a program. Returns its output up to the first read. If the program waits for input, session_id identifies the session to send lines to; otherwise session_id is empty."
    )]
    #[instrument(skip_all)]
    pub async fn run_start(
        &self,
        Parameters(params): Parameters<RunStartParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("Starting program: {} bytes", params.source.len());

        let outcome = self
            .service
            .start_session(&params.source)
            .await
            .map_err(to_mcp_error)?;

        let response = RunStartResponse::from(outcome);
        info!(
            "Program started: interactive={}, session_id='{}'",
            response.interactive, response.session_id
        );
        json_result(&response)
    }

    /// Send one line of input to a waiting program
    #[tool(
        description = "Send one line of input to a program waiting for input. Returns the output produced in answer and whether the program finished."
    )]
    #[instrument(skip_all)]
    pub async fn run_send_line(
        &self,
        Parameters(params): Parameters<RunSendLineParams>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Sending line: session_id={}", params.session_id);

        let session_id = parse_session_id(&params.session_id)?;
        let outcome = self
            .service
            .send_line(&session_id, &params.line)
            .await
            .map_err(to_mcp_error)?;

        json_result(&RunSendLineResponse::from(outcome))
    }

    /// Stop a running program
    #[tool(
        description = "Stop a program immediately. The session stays queryable for the grace period and then expires."
    )]
    #[instrument(skip_all)]
    pub async fn run_stop(
        &self,
        Parameters(params): Parameters<RunStopParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("Stopping program: session_id={}", params.session_id);

        let session_id = parse_session_id(&params.session_id)?;
        let stopped = self.service.force_finish(&session_id);

        let message = if stopped {
            format!("Session '{}' stopped", params.session_id)
        } else {
            format!(
                "Session '{}' was not running (already finished or expired)",
                params.session_id
            )
        };
        json_result(&RunStopResponse {
            session_id: params.session_id,
            stopped,
            message,
        })
    }

    /// Inspect one session
    #[tool(
        description = "Get a session's state and output. Pass `since` to fetch only output chunks after that many."
    )]
    #[instrument(skip_all)]
    pub async fn run_session_get(
        &self,
        Parameters(params): Parameters<SessionGetParams>,
    ) -> Result<CallToolResult, McpError> {
        debug!(
            "Getting session: session_id={}, since={:?}",
            params.session_id, params.since
        );

        let session_id = parse_session_id(&params.session_id)?;
        let snapshot = self.service.session(&session_id).map_err(to_mcp_error)?;
        let output = self
            .service
            .output_since(&session_id, params.since.unwrap_or(0))
            .map_err(to_mcp_error)?;

        json_result(&SessionGetResponse {
            session: SessionInfo::from(&snapshot),
            output,
            transcript: snapshot.transcript,
        })
    }

    /// List all live sessions
    #[tool(description = "List all live sessions, oldest first")]
    #[instrument(skip_all)]
    pub async fn run_session_list(
        &self,
        Parameters(_params): Parameters<SessionListParams>,
    ) -> Result<CallToolResult, McpError> {
        let sessions: Vec<SessionInfo> = self
            .service
            .list()
            .iter()
            .map(SessionInfo::from)
            .collect();
        let count = sessions.len();

        info!("Found {} live session(s)", count);
        json_result(&SessionListResponse { sessions, count })
    }
}

// Implement the ServerHandler trait to define server capabilities
#[tool_handler]
impl rmcp::ServerHandler for CodeRunMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "CodeRun MCP Server - Build and run programs interactively. \
                 Use run_start to run a program; when it waits for input, send lines with \
                 run_send_line until it finishes. run_stop ends a program early, and \
                 run_session_get / run_session_list inspect live sessions."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
