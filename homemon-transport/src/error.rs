use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to encode raw metric: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("publisher for subject {subject} is closed")]
    Closed { subject: String },
}
