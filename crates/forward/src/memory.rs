//! Memory channel — records every emit in memory.
//!
//! Test support: integration tests assert on the exact record sequence a
//! pipeline produced, the way a collector would have seen it.

use async_trait::async_trait;
use testrelay_core::{ForwardChannel, ForwardError, Record};
use tokio::sync::Mutex;

/// One captured emit.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedRecord {
    pub label: Option<String>,
    pub timestamp: i64,
    pub record: Record,
}

/// A channel that stores emitted records instead of transmitting them.
pub struct MemoryChannel {
    tag: String,
    emitted: Mutex<Vec<EmittedRecord>>,
}

impl MemoryChannel {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            emitted: Mutex::new(Vec::new()),
        }
    }

    /// A copy of everything emitted so far, in order.
    pub async fn emitted(&self) -> Vec<EmittedRecord> {
        self.emitted.lock().await.clone()
    }

    /// Drain the captured records.
    pub async fn take(&self) -> Vec<EmittedRecord> {
        std::mem::take(&mut *self.emitted.lock().await)
    }
}

#[async_trait]
impl ForwardChannel for MemoryChannel {
    fn tag(&self) -> &str {
        &self.tag
    }

    async fn emit(
        &self,
        label: Option<&str>,
        timestamp: i64,
        record: &Record,
    ) -> Result<(), ForwardError> {
        self.emitted.lock().await.push(EmittedRecord {
            label: label.map(str::to_string),
            timestamp,
            record: record.clone(),
        });
        Ok(())
    }
}
