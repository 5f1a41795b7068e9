use homemon_core::RegistryError;
use homemon_transport::TransportError;
use thiserror::Error;

use crate::source::SourceError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("sensor source error: {0}")]
    Source(#[from] SourceError),

    /// Failures before the first collection; the service cannot start.
    #[error("setup failed: {0}")]
    Setup(#[source] SourceError),
}
