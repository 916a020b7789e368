//! # testrelay Core
//!
//! Domain types, traits, and error definitions for the testrelay event
//! pipeline. This crate defines the model that all other crates implement
//! against: the ordered event record, the lifecycle stage set, the error
//! taxonomy, and the outbound channel trait.
//!
//! Implementations live in their respective crates; everything depends
//! inward on core.

pub mod error;
pub mod record;
pub mod sink;
pub mod stage;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ForwardError, PatchError, Result, RuntimeError, SettingsError};
pub use record::Record;
pub use sink::ForwardChannel;
pub use stage::Stage;
