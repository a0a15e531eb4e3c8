//! Greeting rule: read a name, greet it, exit.

use crate::policy::Response;
use crate::rules::ResponseRule;

/// Program that reads a whole line into `name` and prints a greeting.
pub struct GreetingRule;

impl GreetingRule {
    /// Create a new greeting rule.
    pub fn new() -> Self {
        Self
    }
}

impl Default for GreetingRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseRule for GreetingRule {
    fn name(&self) -> &'static str {
        "greeting"
    }

    fn priority(&self) -> u32 {
        100
    }

    fn applies(&self, source: &str) -> bool {
        source.contains("std::getline(std::cin, name)") && source.contains("Hello, ")
    }

    fn respond(&self, line: &str) -> Response {
        Response::finish(format!("Hello, {line}!"))
    }
}
