//! ## homemon-engine::source
//! **Sensor sources**
//!
//! A source hands out a credential with a limited validity and, while that
//! credential is fresh, a batch of readings per poll.

use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceError {
    #[error("credential refresh rejected: {0}")]
    Credentials(String),

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// One measurement from one location.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Selects the rule list: `temperature`, `humidity`, `co2`, `noise`.
    pub kind: String,
    /// Raw metric name, e.g. `sensor.environmental.temperature`.
    pub metric: String,
    pub device_id: String,
    pub location: String,
    pub value: f64,
}

impl Reading {
    pub fn new(
        kind: impl Into<String>,
        metric: impl Into<String>,
        device_id: impl Into<String>,
        location: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            kind: kind.into(),
            metric: metric.into(),
            device_id: device_id.into(),
            location: location.into(),
            value,
        }
    }
}

#[async_trait]
pub trait SensorSource: Send {
    /// Obtain a fresh credential and return how long it stays valid.
    async fn refresh_credentials(&mut self) -> Result<Duration, SourceError>;

    async fn poll(&mut self) -> Result<Vec<Reading>, SourceError>;
}

/// Kind, raw metric name and the range simulated values are drawn from.
const CHANNELS: [(&str, &str, f64, f64); 4] = [
    ("temperature", "sensor.environmental.temperature", 14.0, 30.0),
    ("humidity", "sensor.environmental.humidity", 20.0, 80.0),
    ("co2", "sensor.environmental.co2", 400.0, 2000.0),
    ("noise", "sensor.acoustic.noise", 30.0, 80.0),
];

/// Deterministic readings for a fixed set of locations. Two sources built
/// with the same seed produce the same sequence.
pub struct SimulatedSource {
    device_id: String,
    locations: Vec<String>,
    validity: Duration,
    rng: StdRng,
}

impl SimulatedSource {
    pub fn new(device_id: impl Into<String>, locations: Vec<String>, seed: u64) -> Self {
        Self {
            device_id: device_id.into(),
            locations,
            validity: Duration::from_secs(3 * 60 * 60),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }
}

#[async_trait]
impl SensorSource for SimulatedSource {
    async fn refresh_credentials(&mut self) -> Result<Duration, SourceError> {
        Ok(self.validity)
    }

    async fn poll(&mut self) -> Result<Vec<Reading>, SourceError> {
        let mut readings = Vec::with_capacity(self.locations.len() * CHANNELS.len());
        for location in &self.locations {
            for (kind, metric, low, high) in CHANNELS {
                let raw: f64 = self.rng.random_range(low..high);
                // Only temperature carries a fractional part.
                let value = if kind == "temperature" {
                    (raw * 10.0).round() / 10.0
                } else {
                    raw.round()
                };
                readings.push(Reading::new(kind, metric, &self.device_id, location, value));
            }
        }
        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(seed: u64) -> SimulatedSource {
        SimulatedSource::new("sim", vec!["bedroom".into(), "kitchen".into()], seed)
    }

    #[tokio::test]
    async fn same_seed_same_readings() {
        let first = source(7).poll().await.unwrap();
        let second = source(7).poll().await.unwrap();
        assert_eq!(first, second);
        assert_ne!(first, source(8).poll().await.unwrap());
    }

    #[tokio::test]
    async fn every_location_reports_every_channel() {
        let readings = source(1).poll().await.unwrap();
        assert_eq!(readings.len(), 8);
        for (kind, metric, low, high) in CHANNELS {
            let matching: Vec<_> = readings.iter().filter(|r| r.kind == kind).collect();
            assert_eq!(matching.len(), 2);
            for reading in matching {
                assert_eq!(reading.metric, metric);
                assert_eq!(reading.device_id, "sim");
                assert!(reading.value >= low.floor() && reading.value <= high.ceil());
            }
        }
    }

    #[tokio::test]
    async fn credentials_report_validity() {
        let mut source = source(1).with_validity(Duration::from_secs(600));
        assert_eq!(
            source.refresh_credentials().await.unwrap(),
            Duration::from_secs(600)
        );
    }
}
