//! Additional-information callbacks — user-supplied functions that extend
//! event records with custom fields, registered per stage.
//!
//! Registration is checked up front: only the five event-emitting stages
//! accept callbacks, and an unsupported stage is rejected when it is
//! registered, not when it fires.

use std::collections::HashMap;

use testrelay_core::{Record, RuntimeError, Stage};
use uuid::Uuid;

/// Context handed to every callback when its stage fires.
#[derive(Debug, Clone)]
pub struct CallbackContext<'a> {
    pub stage: Stage,
    pub session_id: Uuid,
    pub test_id: Option<Uuid>,
    /// Testcase name, for the testcase stages.
    pub case_name: Option<&'a str>,
}

type Callback = Box<dyn Fn(&CallbackContext<'_>) -> Record + Send + Sync>;

/// Per-stage registry of additional-information callbacks.
#[derive(Default)]
pub struct CallbackRegistry {
    callbacks: HashMap<Stage, Vec<Callback>>,
}

impl CallbackRegistry {
    /// The stages that accept callbacks. `logging` records are formatted by
    /// the bridge and take no user extensions.
    pub const SUPPORTED: [Stage; 5] = [
        Stage::SessionStart,
        Stage::SessionFinish,
        Stage::CaseStart,
        Stage::CaseReport,
        Stage::CaseFinish,
    ];

    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for `stage`.
    pub fn register<F>(&mut self, stage: Stage, callback: F) -> Result<(), RuntimeError>
    where
        F: Fn(&CallbackContext<'_>) -> Record + Send + Sync + 'static,
    {
        if !Self::SUPPORTED.contains(&stage) {
            return Err(RuntimeError::UnsupportedCallbackStage { stage });
        }
        self.callbacks
            .entry(stage)
            .or_default()
            .push(Box::new(callback));
        Ok(())
    }

    /// Run every callback registered for `ctx.stage` and merge the results
    /// in registration order (later callbacks win on colliding fields).
    pub fn collect(&self, ctx: &CallbackContext<'_>) -> Record {
        let mut info = Record::new();
        let Some(callbacks) = self.callbacks.get(&ctx.stage) else {
            return info;
        };
        for callback in callbacks {
            for (field, value) in callback(ctx) {
                info.insert(field, value);
            }
        }
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testrelay_core::record::record_from;

    fn ctx(stage: Stage) -> CallbackContext<'static> {
        CallbackContext {
            stage,
            session_id: Uuid::new_v4(),
            test_id: None,
            case_name: None,
        }
    }

    #[test]
    fn unsupported_stage_rejected_at_registration() {
        let mut registry = CallbackRegistry::new();
        let err = registry
            .register(Stage::Logging, |_| Record::new())
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::UnsupportedCallbackStage {
                stage: Stage::Logging
            }
        ));
    }

    #[test]
    fn callbacks_merge_in_registration_order() {
        let mut registry = CallbackRegistry::new();
        registry
            .register(Stage::SessionStart, |_| {
                record_from([("host", "ci-1"), ("run", "nightly")])
            })
            .unwrap();
        registry
            .register(Stage::SessionStart, |_| record_from([("host", "ci-2")]))
            .unwrap();

        let info = registry.collect(&ctx(Stage::SessionStart));
        assert_eq!(info["host"], "ci-2");
        assert_eq!(info["run"], "nightly");
    }

    #[test]
    fn stage_without_callbacks_yields_empty_record() {
        let registry = CallbackRegistry::new();
        assert!(registry.collect(&ctx(Stage::CaseFinish)).is_empty());
    }

    #[test]
    fn callback_sees_the_context() {
        let mut registry = CallbackRegistry::new();
        registry
            .register(Stage::CaseStart, |ctx| {
                record_from([("case", ctx.case_name.unwrap_or("?"))])
            })
            .unwrap();

        let session_id = Uuid::new_v4();
        let info = registry.collect(&CallbackContext {
            stage: Stage::CaseStart,
            session_id,
            test_id: Some(Uuid::new_v4()),
            case_name: Some("tests/test_api.py::test_get"),
        });
        assert_eq!(info["case"], "tests/test_api.py::test_get");
    }
}
