//! CLI commands and the shared option surface.

pub mod check;
pub mod replay;

use clap::Args;
use testrelay_core::RuntimeError;
use testrelay_runtime::RelayOptions;
use testrelay_settings::{ArgSnapshot, EnvSnapshot, Resolver};
use uuid::Uuid;

/// Used when `--settings` is not given: address every stage with the
/// `--tag`/`--label` flag values.
pub const DEFAULT_SETTINGS: &str = r#"{"all": {"tag": "<tag>", "label": "<label>"}}"#;

/// Options shared by every command. Settings documents can reference any of
/// the value flags, e.g. `"tag": "<tag>"` or `"label": "<label>"`.
#[derive(Debug, Clone, Args)]
pub struct RelayArgs {
    /// Fluentd remote host
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Fluentd forward port
    #[arg(long, default_value_t = 24224)]
    pub port: u16,

    /// Default transmission tag
    #[arg(long, default_value = "test")]
    pub tag: String,

    /// Default transmission label
    #[arg(long, default_value = "pytest")]
    pub label: String,

    /// Stage settings: file path (.json/.yaml/.yml) or inline document
    #[arg(long, default_value = DEFAULT_SETTINGS)]
    pub settings: String,

    /// Record field to stamp with a UTC ISO-8601 timestamp
    #[arg(long)]
    pub timestamp_field: Option<String>,

    /// Reuse an externally created session identifier (UUID)
    #[arg(long)]
    pub session_id: Option<String>,

    /// Bridge ambient tracing records into the pipeline
    #[arg(long)]
    pub extend_logging: bool,

    /// Forward testcase docstrings on result records
    #[arg(long)]
    pub add_docstrings: bool,
}

impl RelayArgs {
    /// Snapshot of the parsed option values, for `<name>` references.
    pub fn arg_snapshot(&self) -> ArgSnapshot {
        let mut snapshot = ArgSnapshot::from_pairs([
            ("host", self.host.clone()),
            ("port", self.port.to_string()),
            ("tag", self.tag.clone()),
            ("label", self.label.clone()),
        ]);
        if let Some(field) = &self.timestamp_field {
            snapshot.set("timestamp-field", field.clone());
        }
        if let Some(id) = &self.session_id {
            snapshot.set("session-id", id.clone());
        }
        snapshot
    }

    /// Resolver over the current environment and these options.
    pub fn resolver(&self) -> Resolver {
        Resolver::new(EnvSnapshot::capture(), self.arg_snapshot())
    }

    /// Runtime options, with the session identifier parsed.
    pub fn relay_options(&self) -> Result<RelayOptions, RuntimeError> {
        let session_id = self
            .session_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| RuntimeError::InvalidSessionId(e.to_string()))?;
        Ok(RelayOptions {
            session_id,
            timestamp_field: self.timestamp_field.clone(),
            add_docstrings: self.add_docstrings,
        })
    }
}

/// Plain fmt subscriber for commands without the log bridge.
pub fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .init();
}
