//! # coderun-core
//!
//! Core types for coderun.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other coderun crates. It provides:
//!
//! - Session types (SessionId, SessionState, PromptKind)
//! - Error types
//! - Configuration loaded from YAML
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other coderun crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod session;

// Re-export commonly used types
pub use config::{EngineSettings, PolicySettings, ServerConfig, ServerSettings, SessionSettings};
pub use error::{Error, Result};
pub use session::{PromptKind, SessionId, SessionState};
