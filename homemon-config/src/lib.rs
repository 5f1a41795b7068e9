//! # Homemon Configuration
//!
//! Layered configuration for the alert registry, the ingestion service and
//! the command line tool.
//!
//! Sources, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. `<config-dir>/homemon.yaml`, when present
//! 3. `HOMEMON_*` environment variables, `__` separating nested keys
//!    (`HOMEMON_STORE__PREFIX=lab`)
//!
//! Command line flags are applied by the caller after loading.

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use homemon_classify::RuleBook;
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
mod ingest;
mod rules;
mod store;
mod telemetry;
mod validation;

pub use error::ConfigError;
pub use ingest::IngestConfig;
pub use rules::default_rules;
pub use store::{StoreBackend, StoreConfig};
pub use telemetry::{TelemetryConfig, TransportConfig};

/// File name looked up inside the configuration directory.
pub const CONFIG_FILE: &str = "homemon.yaml";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "HOMEMON_";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HomemonConfig {
    /// Backing store selection and key layout.
    #[serde(default)]
    #[validate(nested)]
    pub store: StoreConfig,

    /// Collection and cleanup schedule.
    #[serde(default)]
    #[validate(nested)]
    pub ingest: IngestConfig,

    #[serde(default)]
    #[validate(nested)]
    pub transport: TransportConfig,

    #[serde(default)]
    #[validate(nested)]
    pub telemetry: TelemetryConfig,

    /// Threshold rules keyed by reading kind.
    #[serde(default = "default_rules")]
    #[validate(custom(function = validation::validate_rule_book))]
    pub rules: RuleBook,
}

impl Default for HomemonConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            ingest: IngestConfig::default(),
            transport: TransportConfig::default(),
            telemetry: TelemetryConfig::default(),
            rules: default_rules(),
        }
    }
}

impl HomemonConfig {
    /// Load defaults, then `<config_dir>/homemon.yaml` if it exists, then
    /// `HOMEMON_*` environment variables.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(HomemonConfig::default()));

        let file = config_dir.join(CONFIG_FILE);
        if file.exists() {
            figment = figment.merge(Yaml::file(&file));
        } else {
            tracing::debug!(path = %file.display(), "No configuration file, using defaults");
        }

        Self::finish(figment)
    }

    /// Load from one explicit file. Unlike [`HomemonConfig::load`], a missing
    /// file is an error.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        let figment =
            Figment::from(Serialized::defaults(HomemonConfig::default())).merge(Yaml::file(path));
        Self::finish(figment)
    }

    /// Re-run validation, e.g. after command line overrides.
    pub fn ensure_valid(&self) -> Result<(), ConfigError> {
        self.validate()?;
        Ok(())
    }

    fn finish(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}
