//! Repeat rule: echo lines in a loop until an exit keyword.

use lazy_static::lazy_static;
use regex::Regex;

use crate::policy::Response;
use crate::rules::ResponseRule;

lazy_static! {
    static ref LOOP_KEYWORD: Regex = Regex::new(r"\b(while|for)\b").unwrap();
}

/// Program that keeps reading lines until told to stop.
pub struct RepeatRule {
    /// Lowercased inputs that end the loop
    exit_keywords: Vec<String>,
}

impl RepeatRule {
    /// Create a repeat rule ending on `exit` or `quit`.
    pub fn new() -> Self {
        Self::with_exit_keywords(["exit", "quit"])
    }

    /// Create a repeat rule with custom exit keywords.
    pub fn with_exit_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            exit_keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    fn is_exit(&self, line: &str) -> bool {
        let line = line.to_lowercase();
        self.exit_keywords.iter().any(|k| *k == line)
    }
}

impl Default for RepeatRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseRule for RepeatRule {
    fn name(&self) -> &'static str {
        "repeat"
    }

    fn priority(&self) -> u32 {
        50
    }

    fn applies(&self, source: &str) -> bool {
        LOOP_KEYWORD.is_match(source)
    }

    fn respond(&self, line: &str) -> Response {
        if self.is_exit(line) {
            Response::finish("Program terminated by user.")
        } else {
            Response::await_input(format!(
                "You entered: {line}\nEnter another value (or type 'exit' to quit): > "
            ))
        }
    }
}
