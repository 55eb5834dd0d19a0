//! Sink-specific error types.
//!
//! All sink operations return [`SinkError`] on failure, which can be
//! matched to determine the underlying cause (channel, output, encoding).

use thiserror::Error;

/// Errors that can occur in the sink layer.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Failed to send command to writer actor (channel full or closed).
    #[error("failed to send command to sink writer")]
    ChannelSend,

    /// Writes were dropped during a collection cycle.
    #[error("sink dropped {0} writes")]
    Dropped(u64),

    /// Output stream write failed.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error (e.g., thread spawn or join failure).
    #[error("internal error: {0}")]
    Internal(String),
}
