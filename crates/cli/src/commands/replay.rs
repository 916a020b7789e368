//! `testrelay replay` — drive a recorded lifecycle event stream through a
//! full pipeline.
//!
//! The stream is JSON lines, one lifecycle event per line; blank lines and
//! `#` comments are skipped. `--dry-run` swaps the Fluentd channels for the
//! console channel.

use std::path::Path;
use std::sync::Arc;

use testrelay_core::{Error, ForwardChannel, Result, SettingsError};
use testrelay_forward::{ConsoleChannel, EventRouter, FluentChannel, FluentConfig};
use testrelay_patch::ContentPatcher;
use testrelay_runtime::{LifecycleEvent, LogBridge, RelayRuntime};
use testrelay_settings::{compile, load};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use super::RelayArgs;

pub async fn run(relay: &RelayArgs, events: &Path, dry_run: bool, level: &str) -> Result<()> {
    let raw = load(&relay.settings)?;
    let compiled = compile(&raw, &relay.resolver());

    let fluent = FluentConfig {
        host: relay.host.clone(),
        port: relay.port,
    };
    let router = EventRouter::from_tags(compiled.distinct_tags(), |tag| {
        if dry_run {
            Arc::new(ConsoleChannel::new(tag)) as Arc<dyn ForwardChannel>
        } else {
            Arc::new(FluentChannel::new(tag, fluent.clone())) as Arc<dyn ForwardChannel>
        }
    });

    let runtime = RelayRuntime::new(
        ContentPatcher::new(compiled),
        router,
        relay.relay_options()?,
    );

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));
    let fmt = tracing_subscriber::fmt::layer().with_target(false);
    if relay.extend_logging {
        let bridge = LogBridge::new(runtime.patcher(), runtime.context(), runtime.router())?;
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt)
            .with(bridge)
            .init();
    } else {
        tracing_subscriber::registry().with(filter).with(fmt).init();
    }

    info!(session = %runtime.session_id(), events = %events.display(), "Replaying event stream");

    let content = std::fs::read_to_string(events).map_err(|e| {
        Error::Settings(SettingsError::Read {
            path: events.display().to_string(),
            reason: e.to_string(),
        })
    })?;

    let mut dispatched = 0usize;
    let mut failed_sends = 0usize;
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event: LifecycleEvent = serde_json::from_str(line).map_err(|e| {
            Error::Settings(SettingsError::Parse(format!(
                "event stream line {}: {e}",
                number + 1
            )))
        })?;
        if !runtime.dispatch(&event).await? {
            failed_sends += 1;
        }
        dispatched += 1;
    }

    runtime.router().shutdown_all().await;

    if failed_sends > 0 {
        warn!(dispatched, failed_sends, "Replay finished with failed sends");
    } else {
        info!(dispatched, "Replay finished");
    }
    Ok(())
}
