//! # Homemon Transport
//!
//! Fan-out of raw sensor readings, independent of the alert registry.
//! Each reading is encoded as JSON and addressed to `[prefix.]<metric name>`.

mod error;
mod metric;
mod publisher;

pub use error::TransportError;
pub use metric::{subject_for, RawMetric};
pub use publisher::{ChannelPublisher, Envelope, LogPublisher, RawPublisher};
