//! Backing store connection and key layout.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

/// Which backing store implementation to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Shared Redis server; the normal deployment.
    #[default]
    Redis,
    /// Process-local maps. Nothing is shared between processes.
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    #[validate(custom(function = validation::validate_redis_url))]
    pub redis_url: String,

    /// Namespace for every registry key (`<prefix>:priority`, ...).
    #[serde(default = "default_prefix")]
    #[validate(custom(function = validation::validate_namespace))]
    pub prefix: String,

    /// Optional second namespace level, appended as `<prefix>:<sub_prefix>`.
    #[serde(default)]
    #[validate(custom(function = validation::validate_namespace))]
    pub sub_prefix: Option<String>,

    /// Deadline for each individual store call. `None` waits indefinitely.
    #[serde(default = "default_op_timeout", with = "humantime_serde")]
    pub op_timeout: Option<Duration>,

    /// Fail listings on index drift instead of skipping the entry.
    #[serde(default)]
    pub strict_listing: bool,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".into()
}

fn default_prefix() -> String {
    "homemon".into()
}

fn default_op_timeout() -> Option<Duration> {
    Some(Duration::from_secs(5))
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            redis_url: default_redis_url(),
            prefix: default_prefix(),
            sub_prefix: None,
            op_timeout: default_op_timeout(),
            strict_listing: false,
        }
    }
}

impl StoreConfig {
    /// Accept either a full URL or a bare `host:port`.
    pub fn set_redis_address(&mut self, address: &str) {
        self.redis_url = if address.contains("://") {
            address.to_string()
        } else {
            format!("redis://{address}")
        };
    }
}
