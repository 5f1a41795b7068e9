//! Logging and raw-metric transport parameters.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TelemetryConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    #[validate(custom(function = validation::validate_log_level))]
    pub log_level: String,

    /// Lowers the default filter to `debug`.
    #[serde(default)]
    pub debug: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            debug: false,
        }
    }
}

impl TelemetryConfig {
    pub fn effective_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.log_level
        }
    }
}

/// Where raw sensor readings are fanned out.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TransportConfig {
    /// Subject prefix; subjects are `<prefix>.<metric>`.
    #[serde(default)]
    #[validate(custom(function = validation::validate_namespace))]
    pub subject_prefix: Option<String>,
}
