//! Error types for the framing engine.

use std::collections::TryReserveError;

use thiserror::Error;

use crate::sink::SinkOp;

/// Errors that end a stream session.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Configuration cannot satisfy the size invariant.
    #[error("invalid frame config: {0}")]
    InvalidConfig(String),

    /// The working buffer could not grow to hold a fragment.
    #[error("failed to buffer fragment: {0}")]
    Allocation(#[from] TryReserveError),
}

/// A failed sink call.
///
/// Sink failures are never fatal to a session; they are logged and the
/// affected frame is retried on the next scheduled flush.
#[derive(Debug, Error)]
#[error("sink {op} failed: {message}")]
pub struct SinkError {
    pub op: SinkOp,
    pub message: String,
}

impl SinkError {
    pub fn new(op: SinkOp, message: impl Into<String>) -> Self {
        Self {
            op,
            message: message.into(),
        }
    }
}
