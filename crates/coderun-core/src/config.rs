//! Configuration types for coderun.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Server configuration loaded from YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Server settings
    pub server: ServerSettings,
    /// Session lifecycle settings
    pub session: SessionSettings,
    /// Execution engine settings
    pub engine: EngineSettings,
    /// Response policy settings
    pub policy: PolicySettings,
}

impl ServerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ServerConfig =
            serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.session.sweep_interval_ms == 0 {
            return Err(Error::Config(
                "session.sweep_interval_ms must be > 0".to_string(),
            ));
        }

        self.policy.validate()
    }
}

/// Server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Session lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// How long a finished session stays queryable, in milliseconds
    pub grace_period_ms: u64,
    /// Interval between expiry sweeps, in milliseconds
    pub sweep_interval_ms: u64,
    /// Force-finish sessions left waiting for input longer than this (0 = never)
    pub idle_timeout_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            grace_period_ms: 5000,
            sweep_interval_ms: 1000,
            idle_timeout_secs: 0,
        }
    }
}

impl SessionSettings {
    /// Grace period as a duration.
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    /// Sweep interval as a duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Idle timeout for waiting sessions, if enabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}

/// Execution engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Simulated build latency in milliseconds
    pub compile_delay_ms: u64,
    /// Simulated input turnaround latency in milliseconds
    pub input_delay_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            compile_delay_ms: 1500,
            input_delay_ms: 500,
        }
    }
}

impl EngineSettings {
    /// Engine settings with no simulated latency.
    pub fn immediate() -> Self {
        Self {
            compile_delay_ms: 0,
            input_delay_ms: 0,
        }
    }

    /// Build latency as a duration.
    pub fn compile_delay(&self) -> Duration {
        Duration::from_millis(self.compile_delay_ms)
    }

    /// Input turnaround latency as a duration.
    pub fn input_delay(&self) -> Duration {
        Duration::from_millis(self.input_delay_ms)
    }
}

/// Response policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    /// Inputs that end a looping program (matched case-insensitively)
    pub exit_keywords: Vec<String>,
    /// Output of a non-interactive program with no recognizable output
    pub default_output: String,
    /// Regex with one capture group extracting annotated expected output
    pub expected_output_marker: String,
    /// Source fragment that makes the build fail
    pub compile_error_marker: String,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            exit_keywords: vec!["exit".to_string(), "quit".to_string()],
            default_output: "Program executed successfully.".to_string(),
            expected_output_marker: r"// Expected output: (.+)".to_string(),
            compile_error_marker: "syntax error".to_string(),
        }
    }
}

impl PolicySettings {
    /// Validate the policy settings.
    pub fn validate(&self) -> Result<()> {
        if self.exit_keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(Error::Config(
                "policy.exit_keywords must contain at least one keyword".to_string(),
            ));
        }

        let marker = regex::Regex::new(&self.expected_output_marker).map_err(|e| {
            Error::Config(format!(
                "Invalid regex in policy.expected_output_marker: {e}"
            ))
        })?;
        if marker.captures_len() < 2 {
            return Err(Error::Config(
                "policy.expected_output_marker needs a capture group".to_string(),
            ));
        }

        Ok(())
    }
}
