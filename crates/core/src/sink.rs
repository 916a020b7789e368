//! ForwardChannel trait — the abstraction over outbound transmission.
//!
//! A ForwardChannel carries patched records to a log collector (Fluentd
//! forward port, console, in-memory capture). One channel is opened per
//! distinct non-empty tag at startup and lives for the process lifetime;
//! nothing is created per event.

use async_trait::async_trait;

use crate::error::ForwardError;
use crate::record::Record;

/// The core outbound channel trait.
///
/// Implementations handle wire encoding and connection management. The
/// router treats every channel uniformly: hand over `(label, timestamp,
/// record)` and report the verdict.
#[async_trait]
pub trait ForwardChannel: Send + Sync {
    /// The tag this channel is bound to.
    fn tag(&self) -> &str;

    /// Transmit one record.
    ///
    /// `label` is the sub-classification within the tag (Fluentd appends it
    /// to the tag as `tag.label`); `timestamp` is unix seconds.
    async fn emit(
        &self,
        label: Option<&str>,
        timestamp: i64,
        record: &Record,
    ) -> std::result::Result<(), ForwardError>;

    /// Close the channel gracefully.
    async fn shutdown(&self) -> std::result::Result<(), ForwardError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::record_from;

    struct NullChannel;

    #[async_trait]
    impl ForwardChannel for NullChannel {
        fn tag(&self) -> &str {
            "null"
        }

        async fn emit(
            &self,
            _label: Option<&str>,
            _timestamp: i64,
            _record: &Record,
        ) -> std::result::Result<(), ForwardError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn default_shutdown_is_ok() {
        let ch = NullChannel;
        assert_eq!(ch.tag(), "null");
        ch.emit(Some("label"), 0, &record_from([("k", "v")]))
            .await
            .unwrap();
        ch.shutdown().await.unwrap();
    }
}
