//! Ingestion and maintenance schedule.
//!
//! Three independent timers drive the long-running service:
//! - metrics collection (poll the sensor source and publish)
//! - credential refresh (ahead of the credential's expiry by `credential_margin`)
//! - cleanup (sweep expired alerts)

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IngestConfig {
    #[serde(default = "default_metrics_interval", with = "humantime_serde")]
    #[validate(custom(function = validation::validate_nonzero_duration))]
    pub metrics_interval: Duration,

    #[serde(default = "default_cleanup_interval", with = "humantime_serde")]
    #[validate(custom(function = validation::validate_nonzero_duration))]
    pub cleanup_interval: Duration,

    /// Lifetime of every alert derived from a reading.
    #[serde(default = "default_alert_ttl", with = "humantime_serde")]
    #[validate(custom(function = validation::validate_nonzero_duration))]
    pub alert_ttl: Duration,

    /// How long before a credential expires it is refreshed.
    #[serde(default = "default_credential_margin", with = "humantime_serde")]
    pub credential_margin: Duration,

    /// Locations (rooms) the sensor source reports on.
    #[serde(default = "default_locations")]
    #[validate(length(min = 1))]
    pub locations: Vec<String>,

    /// Device identifier attached to raw metrics.
    #[serde(default = "default_device_id")]
    #[validate(length(min = 1))]
    pub device_id: String,

    /// Seed for the simulated sensor source.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_metrics_interval() -> Duration {
    Duration::from_secs(180)
}

fn default_cleanup_interval() -> Duration {
    Duration::from_secs(15)
}

fn default_alert_ttl() -> Duration {
    Duration::from_secs(300)
}

fn default_credential_margin() -> Duration {
    Duration::from_secs(1800)
}

fn default_locations() -> Vec<String> {
    vec!["bedroom".into(), "living-room".into()]
}

fn default_device_id() -> String {
    "simulated".into()
}

fn default_seed() -> u64 {
    42
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            metrics_interval: default_metrics_interval(),
            cleanup_interval: default_cleanup_interval(),
            alert_ttl: default_alert_ttl(),
            credential_margin: default_credential_margin(),
            locations: default_locations(),
            device_id: default_device_id(),
            seed: default_seed(),
        }
    }
}
