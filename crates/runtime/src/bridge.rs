//! Log bridge — routes ambient `tracing` events through the pipeline under
//! the `logging` pseudo-stage.
//!
//! The bridge is a `tracing_subscriber` layer. Layer callbacks cannot
//! await, so each formatted record is handed to a forwarder task over an
//! unbounded channel and transmitted from there. Patching for the
//! `logging` stage ignores `tag`/`label` (the address comes from the
//! compiled `logging` entry, not the record).

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use testrelay_core::{Record, RuntimeError, Stage};
use testrelay_forward::EventRouter;
use testrelay_patch::ContentPatcher;
use tokio::sync::mpsc;
use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, Layer};

use crate::context::ExecutionContext;

/// Tracing layer that forwards log records to the collector.
pub struct LogBridge {
    context: ExecutionContext,
    patcher: Arc<ContentPatcher>,
    tx: mpsc::UnboundedSender<Record>,
}

impl LogBridge {
    /// Build the bridge and spawn its forwarder task on the current tokio
    /// runtime.
    ///
    /// Fails with [`RuntimeError::MissingLoggingTag`] when the compiled
    /// settings give the `logging` stage no non-empty tag: enabling the
    /// bridge without an address is a startup configuration error.
    pub fn new(
        patcher: Arc<ContentPatcher>,
        context: ExecutionContext,
        router: Arc<EventRouter>,
    ) -> Result<Self, RuntimeError> {
        let tag = match patcher.tag(Stage::Logging) {
            Some(tag) if !tag.is_empty() => tag.to_string(),
            _ => return Err(RuntimeError::MissingLoggingTag),
        };
        let label = patcher.label(Stage::Logging).map(str::to_string);

        let (tx, mut rx) = mpsc::unbounded_channel::<Record>();
        tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                let timestamp = Utc::now().timestamp();
                router
                    .route(&tag, label.as_deref(), &record, timestamp)
                    .await;
            }
        });

        Ok(Self {
            context,
            patcher,
            tx,
        })
    }

    fn build_record(&self, event: &tracing::Event<'_>) -> Record {
        let meta = event.metadata();
        let mut record = Record::new();
        record.insert("type".into(), Value::from("logging"));
        record.insert("where".into(), Value::from(meta.target()));
        record.insert("level".into(), Value::from(meta.level().to_string()));

        let mut visitor = FieldVisitor {
            record: &mut record,
        };
        event.record(&mut visitor);

        let state = self.context.snapshot();
        record.insert(
            "sessionId".into(),
            Value::from(state.session_id.to_string()),
        );
        record.insert(
            "testId".into(),
            state
                .test_id
                .map(|id| Value::from(id.to_string()))
                .unwrap_or(Value::Null),
        );
        record.insert("stage".into(), Value::from(state.phase));
        record
    }
}

impl<S: Subscriber> Layer<S> for LogBridge {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        // The pipeline logs through tracing too; forwarding its own records
        // would loop.
        if event.metadata().target().starts_with("testrelay") {
            return;
        }
        let record = self.build_record(event);
        let patched = self
            .patcher
            .patch_filtered(record, Stage::Logging, &["tag", "label"]);
        let _ = self.tx.send(patched);
    }
}

struct FieldVisitor<'a> {
    record: &'a mut Record,
}

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record.insert(field.name().into(), Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record.insert(field.name().into(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record.insert(field.name().into(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record.insert(field.name().into(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record.insert(field.name().into(), Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record
            .insert(field.name().into(), Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record
            .insert(field.name().into(), Value::from(format!("{value:?}")));
    }
}
