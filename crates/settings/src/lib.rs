//! Stage settings for testrelay.
//!
//! A settings document is a nested mapping keyed by `"all"` (defaults for
//! every stage) or a stage name. This crate loads it from JSON or YAML,
//! validates its shape, resolves reference strings (`$ENV_VAR`, `${ENV_VAR}`,
//! `<cli-option>`) against immutable snapshots, and compiles one fully merged
//! record per lifecycle stage. Compilation runs once at startup; nothing here
//! executes on the per-event hot path.

pub mod compile;
pub mod loader;
pub mod model;
pub mod resolve;

pub use compile::{CompiledSettings, StageSettings, compile};
pub use loader::{load, load_from_path, load_inline};
pub use model::{RawReplace, RawSettings, RawStageSettings};
pub use resolve::{ArgSnapshot, EnvSnapshot, Resolver};
