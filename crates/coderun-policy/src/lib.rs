//! # coderun-policy
//!
//! Response policies for coderun.
//!
//! A response policy stands in for a real build-and-run backend. It decides:
//! - What kind of interactive read (if any) a program performs
//! - What a program prints before it first pauses (or exits)
//! - How a paused program answers a line of input
//!
//! [`PatternPolicy`] implements this with a catalog of source-pattern rules.
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends only on coderun-core.
//! The session layer talks to it exclusively through [`ResponsePolicy`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod policy;
pub mod rules;

// Re-export commonly used types
pub use catalog::{PatternPolicy, GENERIC_PROMPT, NAME_PROMPT, VALUE_PROMPT};
pub use policy::{NextState, Response, ResponsePolicy};
pub use rules::{GreetingRule, RepeatRule, ResponseRule, SumRule};
