//! Console channel — JSON lines on stdout.
//!
//! Used by `testrelay replay --dry-run` to show what would be transmitted
//! without a collector.

use async_trait::async_trait;
use serde_json::json;
use testrelay_core::{ForwardChannel, ForwardError, Record};

/// Prints each event as a single JSON line instead of transmitting it.
pub struct ConsoleChannel {
    tag: String,
}

impl ConsoleChannel {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

#[async_trait]
impl ForwardChannel for ConsoleChannel {
    fn tag(&self) -> &str {
        &self.tag
    }

    async fn emit(
        &self,
        label: Option<&str>,
        timestamp: i64,
        record: &Record,
    ) -> Result<(), ForwardError> {
        let line = json!({
            "tag": self.tag,
            "label": label,
            "time": timestamp,
            "record": record,
        });
        println!("{line}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testrelay_core::record::record_from;

    #[tokio::test]
    async fn emit_always_succeeds() {
        let ch = ConsoleChannel::new("run");
        assert_eq!(ch.tag(), "run");
        let record = record_from([("status", "start")]);
        assert!(ch.emit(Some("pytest"), 0, &record).await.is_ok());
    }
}
