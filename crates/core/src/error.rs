//! Error types for the testrelay domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

use crate::stage::Stage;

/// The top-level error type for all testrelay operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Patch error: {0}")]
    Patch(#[from] PatchError),

    #[error("Forward error: {0}")]
    Forward(#[from] ForwardError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures while loading, validating, or compiling a settings document.
/// Fatal at startup: no event is patched against a half-built table.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings at {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse settings document: {0}")]
    Parse(String),

    #[error("Unsupported settings format: {0}")]
    UnsupportedFormat(String),

    #[error("Settings validation failed: {0}")]
    Validation(String),
}

/// Failures inside the content-patching core.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The compiled entry for a stage lacks `tag` or `label`. A configuration
    /// defect, surfaced to the caller rather than defaulted.
    #[error("No tag/label compiled for stage {stage}")]
    MissingRoute { stage: Stage },
}

/// Failures in outbound transmission. Logged and reported as a failed
/// send; never propagated into the lifecycle callback.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("Connection to {endpoint} failed: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("Failed to encode record: {0}")]
    Encode(String),

    #[error("Failed to send record to {endpoint}: {reason}")]
    Send { endpoint: String, reason: String },
}

/// Failures in lifecycle-runtime wiring.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Stage {stage} does not accept additional-information callbacks")]
    UnsupportedCallbackStage { stage: Stage },

    #[error(
        "No tag compiled for the logging stage; set one under 'logging' or 'all' \
         in the stage settings"
    )]
    MissingLoggingTag,

    #[error("Invalid session identifier: {0}")]
    InvalidSessionId(String),
}
