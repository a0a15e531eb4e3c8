//! Input router: deliver lines of input to paused programs.

use std::sync::Arc;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use coderun_core::{EngineSettings, Error, Result, SessionId, SessionState};
use coderun_policy::ResponsePolicy;

use crate::store::SessionStore;

/// Result of delivering one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputOutcome {
    /// Output the program produced in answer to the line
    pub chunk: String,
    /// Whether the program has exited
    pub finished: bool,
    /// Session state after the line was handled
    pub state: SessionState,
}

impl InputOutcome {
    fn stopped() -> Self {
        Self {
            chunk: String::new(),
            finished: true,
            state: SessionState::Finished,
        }
    }
}

/// A `Busy` claim on a session, released if the send is dropped unanswered.
struct InputClaim<'a> {
    store: &'a SessionStore,
    id: SessionId,
    settled: bool,
}

impl Drop for InputClaim<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let released = self
            .store
            .mutate(&self.id, |s| Ok(s.release_input(Instant::now())))
            .unwrap_or(false);
        if released {
            warn!(
                "Input for session {} was cancelled before it was answered",
                self.id
            );
        }
    }
}

/// Routes input lines to sessions and records the program's answers.
pub struct InputRouter {
    store: Arc<SessionStore>,
    policy: Arc<dyn ResponsePolicy>,
    settings: EngineSettings,
}

impl InputRouter {
    /// Create a new input router.
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

    /// Deliver one line of input to a session.
    ///
    /// Fails with [`Error::SessionNotFound`] for unknown or expired sessions
    /// and [`Error::NotWaiting`] unless the session is waiting for input. The
    /// session is claimed (`Busy`) before any processing, so a second line
    /// for the same session fails fast instead of racing the first.
    ///
    /// If the session is stopped while the line is in flight the stop wins:
    /// the answer is discarded and an empty, finished outcome is returned.
    /// If the returned future is dropped before the line is answered, the
    /// session goes back to waiting for input.
    pub async fn send(&self, id: &SessionId, line: &str) -> Result<InputOutcome> {
        let (source, kind) = self.store.mutate(id, |s| {
            s.begin_input()?;
            Ok((s.source_arc(), s.prompt_kind()))
        })?;
        let mut claim = InputClaim {
            store: &self.store,
            id: *id,
            settled: false,
        };
        debug!("Input accepted: session={}, {} bytes", id, line.len());

        let delay = self.settings.input_delay();
        if !delay.is_zero() {
            sleep(delay).await;
        }

        let response = self.policy.respond(&source, kind, line);
        let next = response.next.state();
        let chunk = response.chunk;

        let applied = self.store.mutate(id, |s| {
            Ok(s.complete_input(chunk.clone(), next, Instant::now()))
        });
        claim.settled = true;

        match applied {
            Ok(true) => {
                let finished = next.is_finished();
                if finished {
                    info!("Program finished: session={}", id);
                }
                Ok(InputOutcome {
                    chunk,
                    finished,
                    state: next,
                })
            }
            Ok(false) | Err(Error::SessionNotFound(_)) => {
                warn!("Session {} was stopped while handling input", id);
                Ok(InputOutcome::stopped())
            }
            Err(err) => Err(err),
        }
    }

    /// Stop a session immediately.
    ///
    /// The session finishes without further output and expires normally.
    /// Unknown sessions are ignored. Returns whether a running session was
    /// stopped.
    pub fn force_finish(&self, id: &SessionId) -> bool {
        match self
            .store
            .mutate(id, |s| Ok(s.force_finish(Instant::now())))
        {
            Ok(stopped) => stopped,
            Err(_) => {
                debug!("Force-finish ignored for unknown session {}", id);
                false
            }
        }
    }
}

impl std::fmt::Debug for InputRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputRouter")
            .field("policy", &self.policy.name())
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ExecutionEngine;
    use coderun_policy::PatternPolicy;
    use std::time::Duration;

    const NAME_PROGRAM: &str = r#"
std::string name;
std::cout << "Enter your name: ";
std::getline(std::cin, name);
std::cout << "Hello, " << name << "!" << std::endl;
"#;

    const LOOP_PROGRAM: &str = r#"
std::string line;
while (std::getline(std::cin, line)) {
    std::cout << line << std::endl;
}
"#;

    fn setup(settings: EngineSettings) -> (Arc<SessionStore>, ExecutionEngine, InputRouter) {
        let store = Arc::new(SessionStore::new());
        let policy: Arc<dyn ResponsePolicy> = Arc::new(PatternPolicy::new());
        let engine = ExecutionEngine::new(Arc::clone(&store), Arc::clone(&policy), settings.clone());
        let router = InputRouter::new(Arc::clone(&store), policy, settings);
        (store, engine, router)
    }

    async fn start(engine: &ExecutionEngine, source: &str) -> SessionId {
        engine.start(source).await.unwrap().session_id.unwrap()
    }

    #[tokio::test]
    async fn test_send_greeting_finishes() {
        let (store, engine, router) = setup(EngineSettings::immediate());
        let id = start(&engine, NAME_PROGRAM).await;

        let outcome = router.send(&id, "Ada").await.unwrap();
        assert_eq!(outcome.chunk, "Hello, Ada!");
        assert!(outcome.finished);
        assert_eq!(outcome.state, SessionState::Finished);

        let session = store.get(&id).unwrap();
        assert_eq!(session.state(), SessionState::Finished);
        assert_eq!(
            session.output().transcript(),
            "Enter your name: > \nHello, Ada!"
        );
    }

    #[tokio::test]
    async fn test_send_after_finish_is_not_waiting() {
        let (_store, engine, router) = setup(EngineSettings::immediate());
        let id = start(&engine, NAME_PROGRAM).await;

        router.send(&id, "Ada").await.unwrap();
        let err = router.send(&id, "anything").await.unwrap_err();
        assert!(matches!(
            err,
            Error::NotWaiting {
                state: SessionState::Finished,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_send_unknown_session() {
        let (_store, _engine, router) = setup(EngineSettings::immediate());
        let err = router.send(&SessionId::new(), "hi").await.unwrap_err();
        assert!(matches!(err, Error::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_loop_reprompts_until_exit() {
        let (store, engine, router) = setup(EngineSettings::immediate());
        let id = start(&engine, LOOP_PROGRAM).await;

        let first = router.send(&id, "foo").await.unwrap();
        assert!(!first.finished);
        assert_eq!(first.state, SessionState::WaitingForInput);
        assert_eq!(
            store.get(&id).unwrap().state(),
            SessionState::WaitingForInput
        );

        let last = router.send(&id, "exit").await.unwrap();
        assert!(last.finished);
        assert_eq!(last.chunk, "Program terminated by user.");
        assert_eq!(store.get(&id).unwrap().output().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_sends_serialize() {
        let (store, engine, router) = setup(EngineSettings::default());
        let id = start(&engine, NAME_PROGRAM).await;

        let (a, b) = tokio::join!(router.send(&id, "Ada"), router.send(&id, "Grace"));

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        let not_waiting = [&a, &b]
            .iter()
            .filter(|r| matches!(r, Err(Error::NotWaiting { .. })))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(not_waiting, 1);
        assert_eq!(store.get(&id).unwrap().output().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_is_observable() {
        let (store, engine, router) = setup(EngineSettings::default());
        let id = start(&engine, NAME_PROGRAM).await;

        let router = Arc::new(router);
        let sender = Arc::clone(&router);
        let task = tokio::spawn(async move { sender.send(&id, "Ada").await });

        // Let the send claim the session and park on its turnaround delay
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.get(&id).unwrap().state(), SessionState::Busy);

        let outcome = task.await.unwrap().unwrap();
        assert!(outcome.finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_finish_while_busy() {
        let (store, engine, router) = setup(EngineSettings::default());
        let id = start(&engine, LOOP_PROGRAM).await;

        let router = Arc::new(router);
        let sender = Arc::clone(&router);
        let task = tokio::spawn(async move { sender.send(&id, "foo").await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(router.force_finish(&id));

        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome, InputOutcome::stopped());

        let session = store.get(&id).unwrap();
        assert_eq!(session.state(), SessionState::Finished);
        assert_eq!(session.output().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_send_releases_session() {
        let (store, engine, router) = setup(EngineSettings::default());
        let id = start(&engine, LOOP_PROGRAM).await;

        let cancelled =
            tokio::time::timeout(Duration::from_millis(100), router.send(&id, "foo")).await;
        assert!(cancelled.is_err());

        let session = store.get(&id).unwrap();
        assert_eq!(session.state(), SessionState::WaitingForInput);
        assert_eq!(session.output().len(), 1);

        let outcome = router.send(&id, "bar").await.unwrap();
        assert!(outcome.chunk.starts_with("You entered: bar"));
        assert_eq!(store.get(&id).unwrap().output().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_send_after_stop_stays_finished() {
        let (store, engine, router) = setup(EngineSettings::default());
        let id = start(&engine, LOOP_PROGRAM).await;

        let send = router.send(&id, "foo");
        tokio::pin!(send);
        assert!(
            tokio::time::timeout(Duration::from_millis(100), &mut send)
                .await
                .is_err()
        );
        assert!(router.force_finish(&id));
        drop(send);

        assert_eq!(store.get(&id).unwrap().state(), SessionState::Finished);
    }

    #[tokio::test]
    async fn test_force_finish_idempotent() {
        let (store, engine, router) = setup(EngineSettings::immediate());
        let id = start(&engine, LOOP_PROGRAM).await;

        assert!(router.force_finish(&id));
        assert!(!router.force_finish(&id));
        assert!(!router.force_finish(&SessionId::new()));
        assert_eq!(store.get(&id).unwrap().state(), SessionState::Finished);

        let err = router.send(&id, "foo").await.unwrap_err();
        assert!(matches!(err, Error::NotWaiting { .. }));
    }
}
