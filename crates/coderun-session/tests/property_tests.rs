//! Property-based tests for the session store and output log.

use std::collections::HashSet;

use proptest::prelude::*;

use coderun_core::{PromptKind, SessionState};
use coderun_session::{OutputLog, Session, SessionStore};

fn prompt_kind() -> impl Strategy<Value = PromptKind> {
    prop_oneof![
        Just(PromptKind::None),
        Just(PromptKind::Name),
        Just(PromptKind::Value),
        Just(PromptKind::Generic),
    ]
}

proptest! {
    /// Live session identifiers never repeat.
    #[test]
    fn test_created_ids_are_unique(kinds in prop::collection::vec(prompt_kind(), 1..64)) {
        let store = SessionStore::new();
        let mut seen = HashSet::new();

        for kind in kinds {
            let id = store.create("src", kind).unwrap();
            prop_assert!(seen.insert(id));
        }
        prop_assert_eq!(store.len(), seen.len());
    }

    /// Removing any mix of live, removed and unknown ids never fails and
    /// leaves exactly the untouched sessions.
    #[test]
    fn test_remove_is_idempotent(count in 1usize..16, removals in prop::collection::vec(0usize..32, 0..48)) {
        let store = SessionStore::new();
        let ids: Vec<_> = (0..count)
            .map(|_| store.create("src", PromptKind::None).unwrap())
            .collect();

        let mut removed = HashSet::new();
        for index in removals {
            match ids.get(index) {
                Some(id) => {
                    let was_live = removed.insert(*id);
                    prop_assert_eq!(store.remove(id), was_live);
                }
                None => prop_assert!(!store.remove(&coderun_core::SessionId::new())),
            }
        }
        prop_assert_eq!(store.len(), count - removed.len());
    }

    /// Appending only ever grows the log and keeps earlier chunks intact.
    #[test]
    fn test_output_log_is_append_only(chunks in prop::collection::vec(".{0,24}", 0..32)) {
        let mut log = OutputLog::new();

        for (i, chunk) in chunks.iter().enumerate() {
            let before = log.chunks().to_vec();
            log.append(chunk.clone());

            prop_assert_eq!(log.len(), i + 1);
            prop_assert_eq!(&log.chunks()[..i], before.as_slice());
            prop_assert_eq!(log.since(i), std::slice::from_ref(chunk));
        }
        prop_assert_eq!(log.transcript(), chunks.join("\n"));
    }

    /// Whatever sequence of operations is applied, a finished session never
    /// leaves `Finished` and never gains output.
    #[test]
    fn test_finished_is_terminal(ops in prop::collection::vec(0u8..4, 0..32)) {
        let mut session = Session::new(coderun_core::SessionId::new(), "src", PromptKind::Generic);
        let mut finished_len = None;

        for op in ops {
            let now = tokio::time::Instant::now();
            match op {
                0 => { let _ = session.begin_input(); }
                1 => { session.complete_input("chunk", SessionState::WaitingForInput, now); }
                2 => { session.complete_input("bye", SessionState::Finished, now); }
                _ => { session.force_finish(now); }
            }

            if let Some(len) = finished_len {
                prop_assert_eq!(session.state(), SessionState::Finished);
                prop_assert_eq!(session.output().len(), len);
            } else if session.state().is_finished() {
                finished_len = Some(session.output().len());
            }
        }
    }
}
