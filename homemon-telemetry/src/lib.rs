//! # Homemon Telemetry
//!
//! Log subscriber setup, audit events and Prometheus counters shared by the
//! ingestion service and the command line tool.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
