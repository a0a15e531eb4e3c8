//! # CodeRun MCP Server
//!
//! Model Context Protocol server for running programs interactively: build a
//! program, collect its output up to the first read, then feed it input one
//! line at a time.
//!
//! ## Overview
//!
//! This server provides MCP tools for:
//! - Running programs (run_start)
//! - Sending input and stopping programs (run_send_line, run_stop)
//! - Inspecting sessions (run_session_get, run_session_list)
//!
//! ## Architecture
//!
//! This is Layer 3 - the MCP server binary that ties together:
//! - coderun-core: Core types, errors and configuration
//! - coderun-policy: Program behaviour
//! - coderun-session: Session lifecycle

use std::sync::Arc;

use clap::Parser;
use rmcp::{transport::stdio, ServiceExt};

use coderun::{Cli, CodeRunMcpServer};
use coderun_session::SessionService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    // Log to stderr; stdout carries the MCP transport
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_filter(&config))),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!(
        "CodeRun MCP Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );
    tracing::debug!("Configuration: {:?}", config);

    let service = Arc::new(SessionService::new(&config)?);
    service.start_background_sweeper();

    let server = CodeRunMcpServer::new(Arc::clone(&service));

    tracing::info!("Server initialized, starting stdio transport...");

    // Serve the MCP server over stdio
    let running = server.serve(stdio()).await.map_err(|e| {
        tracing::error!("Error starting server: {}", e);
        e
    })?;

    tracing::info!("CodeRun MCP Server running on stdio");

    // Wait for the client to disconnect
    running.waiting().await?;

    service.shutdown().await;
    tracing::info!("CodeRun MCP Server shutting down");

    Ok(())
}
