//! The lifecycle runtime — one patched, routed record per host callback.
//!
//! Callbacks run sequentially within a worker process. Each one updates the
//! execution context first, then builds its record, patches it for its
//! stage, merges registered additional information, stamps the optional
//! timestamp field, and routes by the stage's compiled (tag, label).

use std::sync::{Arc, RwLock};
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use testrelay_core::{Record, Result, Stage, record::record_from};
use testrelay_forward::EventRouter;
use testrelay_patch::ContentPatcher;
use uuid::Uuid;

use crate::callbacks::{CallbackContext, CallbackRegistry};
use crate::context::ExecutionContext;
use crate::report::{CaseReport, classify};

/// Runtime behavior switches, mirrored from the host's option surface.
#[derive(Debug, Clone, Default)]
pub struct RelayOptions {
    /// Externally supplied session identifier; a fresh v4 UUID otherwise.
    pub session_id: Option<Uuid>,

    /// When set, every record gets a UTC ISO-8601 timestamp under this
    /// field name.
    pub timestamp_field: Option<String>,

    /// Forward testcase docstrings on result records.
    pub add_docstrings: bool,
}

/// Drives the pipeline: patcher and router are built once at startup, then
/// every lifecycle callback flows through [`RelayRuntime::dispatch`] or the
/// individual hook methods.
pub struct RelayRuntime {
    options: RelayOptions,
    patcher: Arc<ContentPatcher>,
    router: Arc<EventRouter>,
    callbacks: CallbackRegistry,
    context: ExecutionContext,
    session_started: RwLock<Option<Instant>>,
}

impl RelayRuntime {
    pub fn new(patcher: ContentPatcher, router: EventRouter, options: RelayOptions) -> Self {
        let session_id = options.session_id.unwrap_or_else(Uuid::new_v4);
        Self {
            options,
            patcher: Arc::new(patcher),
            router: Arc::new(router),
            callbacks: CallbackRegistry::new(),
            context: ExecutionContext::new(session_id),
            session_started: RwLock::new(None),
        }
    }

    /// Shared handle to the execution context (for the log bridge and
    /// fixtures).
    pub fn context(&self) -> ExecutionContext {
        self.context.clone()
    }

    /// The content patcher, shared with the log bridge.
    pub fn patcher(&self) -> Arc<ContentPatcher> {
        Arc::clone(&self.patcher)
    }

    /// The event router, shared with the log bridge.
    pub fn router(&self) -> Arc<EventRouter> {
        Arc::clone(&self.router)
    }

    /// The session identifier.
    pub fn session_id(&self) -> Uuid {
        self.context.session_id()
    }

    /// Register an additional-information callback for `stage`.
    pub fn register_callback<F>(
        &mut self,
        stage: Stage,
        callback: F,
    ) -> std::result::Result<(), testrelay_core::RuntimeError>
    where
        F: Fn(&CallbackContext<'_>) -> Record + Send + Sync + 'static,
    {
        self.callbacks.register(stage, callback)
    }

    /// Session begins.
    pub async fn session_start(&self) -> Result<bool> {
        self.context.set_phase(Stage::SessionStart.phase());
        *self.session_started.write().unwrap() = Some(Instant::now());
        let record = record_from([
            ("status", Value::from("start")),
            ("stage", Value::from(Stage::SessionStart.phase())),
            ("sessionId", Value::from(self.session_id().to_string())),
        ]);
        self.emit(Stage::SessionStart, record, None).await
    }

    /// A testcase begins: installs a fresh test identifier.
    pub async fn case_start(&self, name: &str) -> Result<bool> {
        self.context.set_phase(Stage::CaseStart.phase());
        let test_id = self.context.begin_test();
        let record = record_from([
            ("status", Value::from("start")),
            ("stage", Value::from(Stage::CaseStart.phase())),
            ("sessionId", Value::from(self.session_id().to_string())),
            ("testId", Value::from(test_id.to_string())),
            ("name", Value::from(name)),
        ]);
        self.emit(Stage::CaseStart, record, Some(name)).await
    }

    /// A result report arrives. Indecisive reports (e.g. a passed setup)
    /// transmit nothing and succeed.
    pub async fn case_report(&self, report: &CaseReport) -> Result<bool> {
        self.context.set_phase(Stage::CaseReport.phase());
        let Some(mut record) = classify(report) else {
            return Ok(true);
        };
        record.insert("stage".into(), Value::from(Stage::CaseReport.phase()));
        record.insert("when".into(), Value::from(report.when.as_str()));
        record.insert(
            "sessionId".into(),
            Value::from(self.session_id().to_string()),
        );
        record.insert("testId".into(), self.test_id_value());
        if self.options.add_docstrings {
            if let Some(docstring) = &report.docstring {
                record.insert("docstring".into(), Value::from(docstring.clone()));
            }
        }
        self.emit(Stage::CaseReport, record, Some(report.name.as_str()))
            .await
    }

    /// A testcase ends.
    pub async fn case_finish(&self, name: &str) -> Result<bool> {
        self.context.set_phase(Stage::CaseFinish.phase());
        let record = record_from([
            ("status", Value::from("finish")),
            ("stage", Value::from(Stage::CaseFinish.phase())),
            ("sessionId", Value::from(self.session_id().to_string())),
            ("testId", self.test_id_value()),
            ("name", Value::from(name)),
        ]);
        self.emit(Stage::CaseFinish, record, Some(name)).await
    }

    /// Session ends; carries the elapsed session duration in seconds.
    pub async fn session_finish(&self) -> Result<bool> {
        self.context.set_phase(Stage::SessionFinish.phase());
        let duration = self
            .session_started
            .read()
            .unwrap()
            .map(|started| started.elapsed().as_secs_f64())
            .unwrap_or_default();
        let record = record_from([
            ("status", Value::from("finish")),
            ("duration", Value::from(duration)),
            ("stage", Value::from(Stage::SessionFinish.phase())),
            ("sessionId", Value::from(self.session_id().to_string())),
        ]);
        self.emit(Stage::SessionFinish, record, None).await
    }

    /// Dispatch one recorded lifecycle event.
    pub async fn dispatch(&self, event: &LifecycleEvent) -> Result<bool> {
        match event {
            LifecycleEvent::SessionStart => self.session_start().await,
            LifecycleEvent::CaseStart { name } => self.case_start(name).await,
            LifecycleEvent::CaseReport { report } => self.case_report(report).await,
            LifecycleEvent::CaseFinish { name } => self.case_finish(name).await,
            LifecycleEvent::SessionFinish => self.session_finish().await,
        }
    }

    fn test_id_value(&self) -> Value {
        self.context
            .test_id()
            .map(|id| Value::from(id.to_string()))
            .unwrap_or(Value::Null)
    }

    async fn emit(&self, stage: Stage, record: Record, case_name: Option<&str>) -> Result<bool> {
        let mut record = self.patcher.patch(record, stage);

        let info = self.callbacks.collect(&CallbackContext {
            stage,
            session_id: self.session_id(),
            test_id: self.context.test_id(),
            case_name,
        });
        for (field, value) in info {
            record.insert(field, value);
        }

        if let Some(field) = &self.options.timestamp_field {
            record.insert(
                field.clone(),
                Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
            );
        }

        let (tag, label) = self.patcher.tag_and_label(stage)?;
        Ok(self
            .router
            .route(&tag, Some(label.as_str()), &record, Utc::now().timestamp())
            .await)
    }
}

/// One recorded lifecycle event, as replayed from an event stream file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    SessionStart,
    CaseStart {
        name: String,
    },
    CaseReport {
        #[serde(flatten)]
        report: CaseReport,
    },
    CaseFinish {
        name: String,
    },
    SessionFinish,
}
