//! Sum rule: read two numbers, print their sum, exit.

use crate::policy::Response;
use crate::rules::ResponseRule;

const INVALID_INPUT: &str = "Invalid input. Please enter two numbers separated by space.";

/// Program that extracts two numbers and prints `a + b`.
pub struct SumRule;

impl SumRule {
    /// Create a new sum rule.
    pub fn new() -> Self {
        Self
    }

    /// Parse the first two whitespace-separated numbers of a line.
    ///
    /// Only finite values count; `inf`, `infinity` and `NaN` are rejected.
    fn parse_pair(line: &str) -> Option<(f64, f64)> {
        let mut numbers = line
            .split_whitespace()
            .map(|token| token.parse::<f64>().ok().filter(|n| n.is_finite()));
        let a = numbers.next()??;
        let b = numbers.next()??;
        Some((a, b))
    }

    /// Render a sum, spelling overflow as `Infinity`.
    fn format_sum(sum: f64) -> String {
        if sum == f64::INFINITY {
            "Infinity".to_string()
        } else if sum == f64::NEG_INFINITY {
            "-Infinity".to_string()
        } else {
            sum.to_string()
        }
    }
}

impl Default for SumRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseRule for SumRule {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn priority(&self) -> u32 {
        90
    }

    fn applies(&self, source: &str) -> bool {
        source.contains("std::cin >> a >> b") && source.contains("a + b")
    }

    fn respond(&self, line: &str) -> Response {
        match Self::parse_pair(line) {
            Some((a, b)) => Response::finish(format!("Result: {}", Self::format_sum(a + b))),
            None => Response::finish(INVALID_INPUT),
        }
    }
}
