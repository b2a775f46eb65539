use std::time::Duration;

use thiserror::Error;

/// Errors raised while turning inbound data or settings into engine input
#[derive(Debug, Error)]
pub enum BotError {
    /// Inbound candle message with missing or non-numeric fields.
    /// The message is dropped and the stream keeps going.
    #[error("malformed market data message: {0}")]
    MalformedMessage(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Order submission did not produce a confirmed fill
///
/// Exposure is never changed when one of these is returned.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecutionFailure {
    #[error("order rejected: {reason}")]
    Rejected { reason: String },

    #[error("order timed out after {0:?}")]
    Timeout(Duration),

    #[error("order transport error: {0}")]
    Transport(String),
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::MalformedMessage(err.to_string())
    }
}

impl From<anyhow::Error> for ExecutionFailure {
    fn from(err: anyhow::Error) -> Self {
        ExecutionFailure::Transport(format!("{:#}", err))
    }
}
