//! Lifecycle runtime for testrelay.
//!
//! Glues the pipeline together: the host (or a replayed event stream) drives
//! lifecycle callbacks sequentially, each one builds an event record, patches
//! it against the compiled per-stage settings, extends it with registered
//! additional information, and routes it by (tag, label). An optional
//! `tracing` layer bridges ambient log records into the same pipeline under
//! the `logging` pseudo-stage.

pub mod bridge;
pub mod callbacks;
pub mod context;
pub mod report;
pub mod runtime;

pub use bridge::LogBridge;
pub use callbacks::{CallbackContext, CallbackRegistry};
pub use context::{ExecutionContext, ExecutionState};
pub use report::{CaseOutcome, CasePhase, CaseReport, classify};
pub use runtime::{LifecycleEvent, RelayOptions, RelayRuntime};
