//! Session service: the single entry point the server talks to.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::time::Instant;
use tracing::info;

use coderun_core::{Result, ServerConfig, SessionId};
use coderun_policy::{PatternPolicy, ResponsePolicy};

use crate::engine::{ExecutionEngine, StartOutcome};
use crate::router::{InputOutcome, InputRouter};
use crate::session::SessionSnapshot;
use crate::store::SessionStore;
use crate::sweeper::{ExpirySweeper, SweepReport, SweeperHandle};

/// Ties the store, engine, router and sweeper together over one store.
pub struct SessionService {
    store: Arc<SessionStore>,
    engine: ExecutionEngine,
    router: InputRouter,
    sweeper: Arc<ExpirySweeper>,
    sweeper_handle: Mutex<Option<SweeperHandle>>,
}

impl SessionService {
    /// Build a service using the built-in pattern policy.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let policy = PatternPolicy::from_settings(&config.policy)?;
        Self::with_policy(config, Arc::new(policy))
    }

    /// Build a service around a custom response policy.
    pub fn with_policy(config: &ServerConfig, policy: Arc<dyn ResponsePolicy>) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_store(config, policy, Arc::new(SessionStore::new())))
    }

    /// Build a service over an existing store.
    pub fn with_store(
        config: &ServerConfig,
        policy: Arc<dyn ResponsePolicy>,
        store: Arc<SessionStore>,
    ) -> Self {
        let engine = ExecutionEngine::new(
            Arc::clone(&store),
            Arc::clone(&policy),
            config.engine.clone(),
        );
        let router = InputRouter::new(Arc::clone(&store), policy, config.engine.clone());
        let sweeper = Arc::new(ExpirySweeper::from_settings(
            Arc::clone(&store),
            &config.session,
        ));

        Self {
            store,
            engine,
            router,
            sweeper,
            sweeper_handle: Mutex::new(None),
        }
    }

    /// Start the background expiry sweeper. Calling it again is a no-op.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_background_sweeper(&self) {
        let mut handle = self
            .sweeper_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if handle.is_none() {
            *handle = Some(Arc::clone(&self.sweeper).spawn());
        }
    }

    /// Build and start a program.
    pub async fn start_session(&self, source: &str) -> Result<StartOutcome> {
        self.engine.start(source).await
    }

    /// Send one line of input to a waiting program.
    pub async fn send_line(&self, id: &SessionId, line: &str) -> Result<InputOutcome> {
        self.router.send(id, line).await
    }

    /// Stop a program. Returns whether a running program was stopped.
    pub fn force_finish(&self, id: &SessionId) -> bool {
        self.router.force_finish(id)
    }

    /// Snapshot of one session.
    pub fn session(&self, id: &SessionId) -> Result<SessionSnapshot> {
        Ok(self.store.get(id)?.snapshot(Instant::now()))
    }

    /// Output chunks of one session after the first `since`.
    pub fn output_since(&self, id: &SessionId, since: usize) -> Result<Vec<String>> {
        Ok(self.store.get(id)?.output().since(since).to_vec())
    }

    /// Snapshots of all live sessions, oldest first.
    pub fn list(&self) -> Vec<SessionSnapshot> {
        let now = Instant::now();
        let mut snapshots: Vec<_> = self
            .store
            .list()
            .iter()
            .map(|s| s.snapshot(now))
            .collect();
        snapshots.sort_by(|a, b| b.age.cmp(&a.age));
        snapshots
    }

    /// Run one expiry sweep immediately.
    pub fn sweep_now(&self) -> SweepReport {
        self.sweeper.sweep()
    }

    /// Stop the sweeper and drop every session.
    pub async fn shutdown(&self) {
        let handle = self
            .sweeper_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }
        self.store.clear();
        info!("Session service shut down");
    }

    /// The underlying session store.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService")
            .field("sessions", &self.store.len())
            .field("engine", &self.engine)
            .field("router", &self.router)
            .field("sweeper", &self.sweeper)
            .finish()
    }
}
