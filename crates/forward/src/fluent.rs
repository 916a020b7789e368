//! Fluentd forward-protocol channel.
//!
//! Wire format: one msgpack array `[tag, time, record]` per event, written
//! to the collector's forward port over TCP. The label, when present, is
//! appended to the tag (`tag.label`), matching the Fluentd convention.
//!
//! The connection is opened lazily on first emit and dropped on a send
//! error, so the next emit reconnects. No retry/backoff: a failed send is
//! reported to the router and the record is gone.

use async_trait::async_trait;
use testrelay_core::{ForwardChannel, ForwardError, Record};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::debug;

/// Fluent channel configuration.
#[derive(Debug, Clone)]
pub struct FluentConfig {
    /// Host of the Fluentd instance.
    pub host: String,
    /// Forward port of the Fluentd instance.
    pub port: u16,
}

impl Default for FluentConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 24224,
        }
    }
}

/// A forward channel bound to one tag, speaking the Fluentd forward
/// protocol.
pub struct FluentChannel {
    tag: String,
    endpoint: String,
    stream: Mutex<Option<TcpStream>>,
}

impl FluentChannel {
    pub fn new(tag: impl Into<String>, config: FluentConfig) -> Self {
        Self {
            tag: tag.into(),
            endpoint: format!("{}:{}", config.host, config.port),
            stream: Mutex::new(None),
        }
    }

    fn full_tag(&self, label: Option<&str>) -> String {
        match label {
            Some(label) if !label.is_empty() => format!("{}.{}", self.tag, label),
            _ => self.tag.clone(),
        }
    }

    fn encode(
        full_tag: &str,
        timestamp: i64,
        record: &Record,
    ) -> Result<Vec<u8>, ForwardError> {
        rmp_serde::to_vec(&(full_tag, timestamp, record))
            .map_err(|e| ForwardError::Encode(e.to_string()))
    }
}

#[async_trait]
impl ForwardChannel for FluentChannel {
    fn tag(&self) -> &str {
        &self.tag
    }

    async fn emit(
        &self,
        label: Option<&str>,
        timestamp: i64,
        record: &Record,
    ) -> Result<(), ForwardError> {
        let payload = Self::encode(&self.full_tag(label), timestamp, record)?;

        let mut guard = self.stream.lock().await;
        let stream = match guard.as_mut() {
            Some(stream) => stream,
            None => {
                let stream = TcpStream::connect(&self.endpoint).await.map_err(|e| {
                    ForwardError::Connect {
                        endpoint: self.endpoint.clone(),
                        reason: e.to_string(),
                    }
                })?;
                debug!(endpoint = %self.endpoint, tag = %self.tag, "Connected to forward port");
                guard.insert(stream)
            }
        };

        if let Err(e) = stream.write_all(&payload).await {
            // Drop the connection; the next emit reconnects.
            *guard = None;
            return Err(ForwardError::Send {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            });
        }
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ForwardError> {
        let mut guard = self.stream.lock().await;
        if let Some(mut stream) = guard.take() {
            stream
                .shutdown()
                .await
                .map_err(|e| ForwardError::Send {
                    endpoint: self.endpoint.clone(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }
}
