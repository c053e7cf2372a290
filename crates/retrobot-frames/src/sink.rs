//! The external channel that frames are delivered to.

use std::fmt;

use async_trait::async_trait;

use crate::error::SinkError;

/// Which sink operation a call or failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkOp {
    Send,
    Edit,
    Reply,
}

impl SinkOp {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkOp::Send => "send",
            SinkOp::Edit => "edit",
            SinkOp::Reply => "reply",
        }
    }
}

impl fmt::Display for SinkOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A messaging channel that accepts discrete, size-capped messages.
///
/// Content passed to every method is at most the session's
/// `max_frame_length` characters. Calls for one session are always issued
/// sequentially.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Identifies a message previously created by `send` or `reply`.
    type Handle: Clone + fmt::Debug + Send + Sync + 'static;

    /// Start a new message.
    async fn send(&self, content: &str) -> Result<Self::Handle, SinkError>;

    /// Replace the content of an existing message.
    ///
    /// Returns whether the message changed.
    async fn edit(&self, handle: &Self::Handle, content: &str) -> Result<bool, SinkError>;

    /// Start a new message anchored to an earlier one.
    async fn reply(&self, handle: &Self::Handle, content: &str)
    -> Result<Self::Handle, SinkError>;
}
