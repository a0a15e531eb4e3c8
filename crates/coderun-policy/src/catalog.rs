//! Pattern catalog policy: program behavior inferred from source text.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use coderun_core::{Error, PolicySettings, PromptKind, Result};

use crate::policy::{Response, ResponsePolicy};
use crate::rules::{GreetingRule, RepeatRule, ResponseRule, SumRule};

/// Prompt printed by a program asking for a name.
pub const NAME_PROMPT: &str = "Enter your name: > ";

/// Prompt printed by a program extracting formatted values.
pub const VALUE_PROMPT: &str = "Please enter a value: > ";

/// Prompt printed by a program reading input without a recognizable prompt.
pub const GENERIC_PROMPT: &str = "Program is waiting for input: > ";

const HELLO_WORLD: &str = "Hello, World!";

lazy_static! {
    static ref DEFAULT_EXPECTED_OUTPUT: Regex = Regex::new(r"// Expected output: (.+)").unwrap();
}

/// Response policy backed by a catalog of source-pattern rules.
///
/// Rules are consulted in priority order; a paused program that matches no
/// rule echoes its input and exits.
pub struct PatternPolicy {
    rules: Vec<Arc<dyn ResponseRule>>,
    default_output: String,
    expected_output: Regex,
    compile_error_marker: String,
}

impl PatternPolicy {
    /// Create a policy with the default rule catalog and settings.
    pub fn new() -> Self {
        let defaults = PolicySettings::default();
        let mut policy = Self::empty(
            DEFAULT_EXPECTED_OUTPUT.clone(),
            defaults.default_output,
            defaults.compile_error_marker,
        );
        policy.add_default_rules(&defaults.exit_keywords);
        policy
    }

    /// Create a policy with the default rule catalog and custom settings.
    pub fn from_settings(settings: &PolicySettings) -> Result<Self> {
        settings.validate()?;
        let expected_output = Regex::new(&settings.expected_output_marker)
            .map_err(|e| Error::Config(format!("Invalid expected output marker: {e}")))?;

        let mut policy = Self::empty(
            expected_output,
            settings.default_output.clone(),
            settings.compile_error_marker.clone(),
        );
        policy.add_default_rules(&settings.exit_keywords);
        Ok(policy)
    }

    fn empty(expected_output: Regex, default_output: String, compile_error_marker: String) -> Self {
        Self {
            rules: Vec::new(),
            default_output,
            expected_output,
            compile_error_marker,
        }
    }

    fn add_default_rules(&mut self, exit_keywords: &[String]) {
        self.add_rule(Arc::new(GreetingRule::new()));
        self.add_rule(Arc::new(SumRule::new()));
        self.add_rule(Arc::new(RepeatRule::with_exit_keywords(exit_keywords)));
    }

    /// Add a rule to the catalog.
    pub fn add_rule(&mut self, rule: Arc<dyn ResponseRule>) {
        self.rules.push(rule);
        // Sort by priority (descending)
        self.rules.sort_by_key(|r| std::cmp::Reverse(r.priority()));
    }

    /// Names of the rules in consultation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    fn matching_rule(&self, source: &str) -> Option<&Arc<dyn ResponseRule>> {
        self.rules.iter().find(|r| r.applies(source))
    }

    /// Full output of a program that never reads input.
    fn batch_output(&self, source: &str) -> String {
        if source.contains(&format!("std::cout << \"{HELLO_WORLD}\"")) {
            return HELLO_WORLD.to_string();
        }

        self.expected_output
            .captures(source)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim_end_matches('\r').to_string())
            .unwrap_or_else(|| self.default_output.clone())
    }
}

impl Default for PatternPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponsePolicy for PatternPolicy {
    fn name(&self) -> &'static str {
        "pattern-catalog"
    }

    fn classify(&self, source: &str) -> PromptKind {
        if !(source.contains("std::cin") || source.contains("std::getline")) {
            PromptKind::None
        } else if source.contains("Enter your name:") {
            PromptKind::Name
        } else if source.contains("std::cin >> ") {
            PromptKind::Value
        } else {
            PromptKind::Generic
        }
    }

    fn launch(&self, source: &str, kind: PromptKind) -> Result<String> {
        if !self.compile_error_marker.is_empty() && source.contains(&self.compile_error_marker) {
            return Err(Error::CompilationFailed(format!(
                "Compilation error: {}",
                self.compile_error_marker
            )));
        }

        let output = match kind {
            PromptKind::None => self.batch_output(source),
            PromptKind::Name => NAME_PROMPT.to_string(),
            PromptKind::Value => VALUE_PROMPT.to_string(),
            PromptKind::Generic => GENERIC_PROMPT.to_string(),
        };
        Ok(output)
    }

    fn respond(&self, source: &str, kind: PromptKind, line: &str) -> Response {
        match self.matching_rule(source) {
            Some(rule) => {
                debug!("Responding with rule '{}' (prompt kind {:?})", rule.name(), kind);
                rule.respond(line)
            }
            None => {
                debug!("No rule matched (prompt kind {:?}), echoing input", kind);
                Response::finish(format!("You entered: {line}"))
            }
        }
    }
}
