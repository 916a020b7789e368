//! Event router — maps each (tag, label) pair to an outbound channel and
//! hands off the final record for transmission.
//!
//! A broken forwarding pipe degrades observability, never the test run:
//! routing failures are logged and reported, not raised.

use std::collections::HashMap;
use std::sync::Arc;

use testrelay_core::{ForwardChannel, Record};
use tracing::{debug, info, warn};

/// Central registry holding one channel per distinct non-empty tag.
pub struct EventRouter {
    channels: HashMap<String, Arc<dyn ForwardChannel>>,
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRouter {
    /// Create an empty router.
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
        }
    }

    /// Build a router with one channel per tag, using `make` to open each.
    pub fn from_tags<I, F>(tags: I, make: F) -> Self
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Arc<dyn ForwardChannel>,
    {
        let mut router = Self::new();
        for tag in tags {
            router.register(make(&tag));
        }
        router
    }

    /// Register a channel under its bound tag.
    pub fn register(&mut self, channel: Arc<dyn ForwardChannel>) {
        let tag = channel.tag().to_string();
        info!(tag = %tag, "Registered forward channel");
        self.channels.insert(tag, channel);
    }

    /// Get the channel bound to `tag`.
    pub fn get(&self, tag: &str) -> Option<&Arc<dyn ForwardChannel>> {
        self.channels.get(tag)
    }

    /// Number of registered channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no channel is registered.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Route one record.
    ///
    /// An empty `tag` means the configuration disabled transmission for the
    /// stage: success, nothing sent. A non-empty tag without a registered
    /// channel is a configuration/runtime error: warn and report failure.
    /// Otherwise the bound channel's verdict is reported verbatim.
    pub async fn route(
        &self,
        tag: &str,
        label: Option<&str>,
        record: &Record,
        timestamp: i64,
    ) -> bool {
        if tag.is_empty() {
            debug!("Transmission suppressed by configuration");
            return true;
        }
        let Some(channel) = self.channels.get(tag) else {
            warn!(tag = %tag, "No forward channel registered for tag");
            return false;
        };
        match channel.emit(label, timestamp, record).await {
            Ok(()) => true,
            Err(e) => {
                warn!(tag = %tag, error = %e, "Failed to forward record");
                false
            }
        }
    }

    /// Shut down all channels gracefully.
    pub async fn shutdown_all(&self) {
        for (tag, channel) in &self.channels {
            if let Err(e) = channel.shutdown().await {
                warn!(tag = %tag, error = %e, "Failed to shut down forward channel");
            }
        }
    }
}
