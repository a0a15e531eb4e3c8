//! Response rules: one per recognizable program shape.

pub mod greeting;
pub mod repeat;
pub mod sum;

pub use greeting::GreetingRule;
pub use repeat::RepeatRule;
pub use sum::SumRule;

use crate::policy::Response;

/// A rule recognizing one kind of interactive program.
///
/// The pattern catalog asks rules in priority order whether they apply to a
/// source, and lets the first match answer the input line.
pub trait ResponseRule: Send + Sync {
    /// Rule name for debugging/logging.
    fn name(&self) -> &'static str;

    /// Priority (higher = consulted first).
    ///
    /// Typical priorities:
    /// - 100: Single-read programs with a specific reply (greetings)
    /// - 90: Formatted extraction (sums)
    /// - 50: Loops, which match broadly and re-prompt
    fn priority(&self) -> u32;

    /// Whether the source looks like a program this rule answers for.
    fn applies(&self, source: &str) -> bool;

    /// Answer one line of input.
    fn respond(&self, line: &str) -> Response;
}
