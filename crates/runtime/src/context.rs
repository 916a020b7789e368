//! Execution context — the one piece of shared mutable state in the
//! pipeline.
//!
//! Carries the session identifier, the current test identifier, and the
//! current lifecycle phase so that log records formatted while a callback is
//! executing can be tagged. Discipline: the runtime is the single writer
//! (it updates the context immediately on entering a lifecycle callback);
//! the log bridge and fixtures only read. Callbacks are sequential within a
//! worker process, so the lock is uncontended.

use std::sync::{Arc, RwLock};

use uuid::Uuid;

/// A point-in-time view of the execution context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionState {
    /// Unique identifier of the test session.
    pub session_id: Uuid,
    /// Unique identifier of the currently running testcase, if any.
    pub test_id: Option<Uuid>,
    /// Coarse phase tag: `"session"` or `"testcase"`.
    pub phase: &'static str,
}

/// Shared handle to the execution context. Cloning shares the same state.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    inner: Arc<RwLock<ExecutionState>>,
}

impl ExecutionContext {
    /// Create a context for a new session.
    pub fn new(session_id: Uuid) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ExecutionState {
                session_id,
                test_id: None,
                phase: "session",
            })),
        }
    }

    /// Update the current phase. Called on entry to every lifecycle
    /// callback, before any record is built.
    pub fn set_phase(&self, phase: &'static str) {
        self.inner.write().unwrap().phase = phase;
    }

    /// Create and install a fresh test identifier; returns it.
    pub fn begin_test(&self) -> Uuid {
        let test_id = Uuid::new_v4();
        self.inner.write().unwrap().test_id = Some(test_id);
        test_id
    }

    /// The session identifier.
    pub fn session_id(&self) -> Uuid {
        self.inner.read().unwrap().session_id
    }

    /// The current test identifier, if a testcase is running.
    pub fn test_id(&self) -> Option<Uuid> {
        self.inner.read().unwrap().test_id
    }

    /// A consistent snapshot of the whole state.
    pub fn snapshot(&self) -> ExecutionState {
        self.inner.read().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_session_phase_without_test_id() {
        let ctx = ExecutionContext::new(Uuid::new_v4());
        let state = ctx.snapshot();
        assert_eq!(state.phase, "session");
        assert!(state.test_id.is_none());
    }

    #[test]
    fn begin_test_installs_a_fresh_id() {
        let ctx = ExecutionContext::new(Uuid::new_v4());
        let first = ctx.begin_test();
        assert_eq!(ctx.test_id(), Some(first));
        let second = ctx.begin_test();
        assert_ne!(first, second);
        assert_eq!(ctx.test_id(), Some(second));
    }

    #[test]
    fn clones_share_state() {
        let ctx = ExecutionContext::new(Uuid::new_v4());
        let reader = ctx.clone();
        ctx.set_phase("testcase");
        assert_eq!(reader.snapshot().phase, "testcase");
    }
}
