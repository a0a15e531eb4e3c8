//! Command line arguments.

use std::path::PathBuf;

use clap::Parser;

use coderun_core::{Result, ServerConfig};

/// MCP server for interactive build-and-run sessions over stdio.
#[derive(Parser, Debug)]
#[command(name = "coderun")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (overrides the configuration file; RUST_LOG wins over both)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Load the configuration file, or the defaults when none was given.
    pub fn load_config(&self) -> Result<ServerConfig> {
        match &self.config {
            Some(path) => ServerConfig::from_file(path),
            None => Ok(ServerConfig::default()),
        }
    }

    /// Log filter directive to use when `RUST_LOG` is unset.
    pub fn log_filter(&self, config: &ServerConfig) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config.server.log_level.clone())
    }
}
