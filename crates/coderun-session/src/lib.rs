//! # coderun-session
//!
//! Session lifecycle management for coderun.
//!
//! This crate provides:
//! - Session state tracking and append-only output logs
//! - The session store, the single choke point for state transitions
//! - The execution engine (start a program) and input router (feed it lines)
//! - The expiry sweeper reclaiming finished sessions
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends on coderun-core and
//! reaches program behavior only through `coderun_policy::ResponsePolicy`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod output;
pub mod router;
pub mod service;
pub mod session;
pub mod store;
pub mod sweeper;

// Re-export commonly used types
pub use engine::{ExecutionEngine, StartOutcome};
pub use output::OutputLog;
pub use router::{InputOutcome, InputRouter};
pub use service::SessionService;
pub use session::{Session, SessionSnapshot};
pub use store::SessionStore;
pub use sweeper::{ExpirySweeper, SweepReport, SweeperHandle};
