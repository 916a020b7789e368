//! Forward channels and event routing for testrelay.
//!
//! The router maps each compiled tag to one channel, opened at startup and
//! held for the process lifetime. Channels carry patched records outward:
//!
//! - **Fluent** — Fluentd forward protocol, msgpack over TCP
//! - **Console** — JSON lines on stdout, for dry runs
//! - **Memory** — in-memory capture, for tests

pub mod console;
pub mod fluent;
pub mod memory;
pub mod registry;

pub use console::ConsoleChannel;
pub use fluent::{FluentChannel, FluentConfig};
pub use memory::{EmittedRecord, MemoryChannel};
pub use registry::EventRouter;
