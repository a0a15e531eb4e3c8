//! Execution engine: build a program and run it up to its first read.

use std::sync::Arc;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use coderun_core::{EngineSettings, Result, SessionId};
use coderun_policy::ResponsePolicy;

use crate::store::SessionStore;

/// Result of starting a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOutcome {
    /// Output up to the first read (the full output if the program never reads)
    pub output: String,
    /// Session to send input to; `None` when no interaction is possible
    pub session_id: Option<SessionId>,
    /// Whether the program is paused waiting for input
    pub interactive: bool,
}

/// Starts submitted programs and records one session per start.
pub struct ExecutionEngine {
    store: Arc<SessionStore>,
    policy: Arc<dyn ResponsePolicy>,
    settings: EngineSettings,
}

impl ExecutionEngine {
    /// Create a new execution engine.
    pub fn new(
        store: Arc<SessionStore>,
        policy: Arc<dyn ResponsePolicy>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            store,
            policy,
            settings,
        }
    }

    /// Build and start a program.
    ///
    /// Always records exactly one session. A non-interactive program's session
    /// is finished immediately and never surfaced; it stays in the store for
    /// the grace period. A build failure is recorded the same way before the
    /// error is returned.
    pub async fn start(&self, source: &str) -> Result<StartOutcome> {
        debug!(
            "Starting program: {} bytes, policy={}",
            source.len(),
            self.policy.name()
        );

        let delay = self.settings.compile_delay();
        if !delay.is_zero() {
            sleep(delay).await;
        }

        let kind = self.policy.classify(source);
        let launched = self.policy.launch(source, kind);
        let id = self.store.create(source, kind)?;

        let output = match launched {
            Ok(output) => output,
            Err(err) => {
                warn!("Build failed for session {}: {}", id, err);
                let message = err.to_string();
                self.store.mutate(&id, |s| {
                    s.append_output(message);
                    s.finish(Instant::now());
                    Ok(())
                })?;
                return Err(err);
            }
        };

        let interactive = kind.is_interactive();
        self.store.mutate(&id, |s| {
            s.append_output(output.clone());
            if !interactive {
                s.finish(Instant::now());
            }
            Ok(())
        })?;

        if interactive {
            info!("Program waiting for input: session={}, kind={:?}", id, kind);
        } else {
            info!("Program ran to completion: session={}", id);
        }

        Ok(StartOutcome {
            output,
            session_id: interactive.then_some(id),
            interactive,
        })
    }
}

impl std::fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("policy", &self.policy.name())
            .field("settings", &self.settings)
            .finish()
    }
}
