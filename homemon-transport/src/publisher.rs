//! Publisher implementations.
//!
//! Publishing is fire-and-forget from the caller's point of view: the
//! ingestion loop logs a failed publish and moves on to the next reading.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::info;

use crate::{subject_for, RawMetric, TransportError};

#[async_trait]
pub trait RawPublisher: Send + Sync {
    async fn publish(&self, metric: &RawMetric) -> Result<(), TransportError>;
}

/// An addressed, encoded record.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub subject: String,
    pub payload: Bytes,
}

/// Delivers envelopes into a bounded in-process channel. A full channel
/// applies backpressure to the publisher.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    prefix: Option<String>,
    tx: mpsc::Sender<Envelope>,
}

impl ChannelPublisher {
    pub fn new(prefix: Option<String>, capacity: usize) -> (Self, mpsc::Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { prefix, tx }, rx)
    }
}

#[async_trait]
impl RawPublisher for ChannelPublisher {
    async fn publish(&self, metric: &RawMetric) -> Result<(), TransportError> {
        let subject = subject_for(self.prefix.as_deref(), &metric.name);
        let payload = metric.encode()?;
        self.tx
            .send(Envelope { subject, payload })
            .await
            .map_err(|err| TransportError::Closed {
                subject: err.0.subject,
            })
    }
}

/// Emits every record as a structured log event.
#[derive(Debug, Clone, Default)]
pub struct LogPublisher {
    prefix: Option<String>,
}

impl LogPublisher {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }
}

#[async_trait]
impl RawPublisher for LogPublisher {
    async fn publish(&self, metric: &RawMetric) -> Result<(), TransportError> {
        let subject = subject_for(self.prefix.as_deref(), &metric.name);
        let payload = metric.encode()?;
        info!(
            %subject,
            payload = %String::from_utf8_lossy(&payload),
            "Raw metric"
        );
        Ok(())
    }
}
