//! # Homemon Engine
//!
//! Long-running drivers around the alert registry:
//! - `source`: where readings come from (`SensorSource`, `SimulatedSource`)
//! - `ingest`: poll, publish raw, classify, register alerts
//! - `sweeper`: periodic removal of expired alerts
//! - `monitor`: both of the above under one cancellation token

pub mod error;
pub mod ingest;
pub mod monitor;
pub mod source;
pub mod sweeper;

pub use error::EngineError;
pub use ingest::{refresh_period, IngestionService, RecordSummary, MIN_REFRESH};
pub use monitor::Monitor;
pub use source::{Reading, SensorSource, SimulatedSource, SourceError};
pub use sweeper::MaintenanceSweeper;
