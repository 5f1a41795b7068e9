//! Raw metric record and subject naming.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::TransportError;

/// One sensor reading as published on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMetric {
    pub name: String,
    pub device_id: String,
    pub location: String,
    pub value: f64,
}

impl RawMetric {
    pub fn new(
        name: impl Into<String>,
        device_id: impl Into<String>,
        location: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            name: name.into(),
            device_id: device_id.into(),
            location: location.into(),
            value,
        }
    }

    pub fn encode(&self) -> Result<Bytes, TransportError> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }
}

/// `prefix.name`, or the bare name when the prefix is absent or empty.
pub fn subject_for(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}.{name}"),
        _ => name.to_string(),
    }
}
