//! ## homemon-telemetry::logging
//! **Subscriber setup and structured audit events**
//!
//! Logs go to stderr so `metrics list` output on stdout stays clean.
//! `RUST_LOG` takes precedence over the configured level.

use opentelemetry::KeyValue;
use tracing::{info_span, Instrument};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Install the global subscriber. Returns `false` if one was already set.
    pub fn init(default_level: &str) -> bool {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
            )
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
            .is_ok()
    }

    /// Record a registry mutation (`alert_published`, `alert_swept`, ...)
    /// with its attributes.
    #[inline]
    pub async fn log_event(event_type: &str, metadata: Vec<KeyValue>) {
        let span = info_span!("registry_event", event_type = event_type, otel.kind = "INTERNAL");

        async {
            tracing::info!(metadata = ?metadata, "Registry event");
        }
        .instrument(span)
        .await
    }
}
