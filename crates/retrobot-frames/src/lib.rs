//! Paced, size-bounded framing of streamed text.
//!
//! This crate turns an incrementally generated text stream (typically an LLM
//! response) into a sequence of chat messages that respect three constraints
//! at once:
//!
//! - **Size**: no frame ever exceeds the configured maximum length.
//! - **Pacing**: sink mutations happen at most once per flush interval.
//! - **Structure**: frames split at line breaks, then word breaks, then hard
//!   cuts, and triple-backtick code fences stay balanced in every frame.
//!
//! # Data Flow
//!
//! ```text
//! fragment source ─▶ Accumulator ─▶ FrameSplitter ─▶ DeliveryQueue ─▶ Sink
//!                        │               ▲
//!                        └─ PacedScheduler (on each fragment / at the end)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use retrobot_frames::{FrameConfig, StreamSession};
//!
//! let session = StreamSession::new(FrameConfig::default(), sink)?;
//! let summary = session.run(fragments).await?;
//! tracing::info!(frames = summary.frames, "stream delivered");
//! ```

pub mod accumulator;
pub mod config;
pub mod delivery;
pub mod error;
pub mod fence;
pub mod pacing;
pub mod session;
pub mod sink;
pub mod splitter;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub(crate) mod testing;

pub use accumulator::Accumulator;
pub use config::FrameConfig;
pub use delivery::{DeliveryQueue, OpenFrame};
pub use error::{FrameError, SinkError};
pub use fence::FenceTracker;
pub use pacing::{PacedScheduler, should_flush};
pub use session::{StreamSession, StreamSummary};
pub use sink::{Sink, SinkOp};
pub use splitter::{Frame, FrameSplitter};

/// Count characters the way chat platforms do (Unicode scalar values).
#[must_use]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
