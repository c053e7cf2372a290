use std::time::Duration;

use crate::error::FrameError;
use crate::fence::{CLOSE_MARKER_LEN, MAX_REOPEN_LEN};

/// Discord's per-message character ceiling.
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 2000;
/// Default minimum time between sink mutations.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(1000);
/// How far back from a cut point to look for whitespace.
pub const DEFAULT_WORD_WINDOW: usize = 128;
/// Default width at which an unterminated line is wrapped early: the
/// longest line a default-sized frame carries whole.
pub const DEFAULT_PREWRAP_WIDTH: usize = DEFAULT_MAX_FRAME_LENGTH - CLOSE_MARKER_LEN;
/// Smallest frame length that leaves room for content after fence padding.
pub const MIN_FRAME_LENGTH: usize = 64;

/// Limits and pacing for one stream session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Hard cap on frame length, in characters.
    pub max_frame_length: usize,
    /// Minimum time between pacing flushes.
    pub flush_interval: Duration,
    /// Window (in characters before a cut) searched for a word break.
    pub word_window: usize,
    /// Character width at which the partial line is wrapped before its
    /// newline arrives. Never below [`line_budget`](Self::line_budget), so a
    /// line that fits in a frame is never cut. `None` wraps at line breaks
    /// only.
    pub prewrap_width: Option<usize>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            word_window: DEFAULT_WORD_WINDOW,
            prewrap_width: Some(DEFAULT_PREWRAP_WIDTH),
        }
    }
}

impl FrameConfig {
    /// Config with the given frame cap and defaults elsewhere.
    #[must_use]
    pub fn with_max_frame_length(max_frame_length: usize) -> Self {
        Self {
            max_frame_length,
            ..Self::default()
        }
    }

    /// Characters available to a frame's content once the worst-case fence
    /// padding (re-open prefix and closing marker) is reserved.
    #[must_use]
    pub fn content_budget(&self) -> usize {
        self.max_frame_length
            .saturating_sub(CLOSE_MARKER_LEN + MAX_REOPEN_LEN)
    }

    /// Longest line a frame can carry without cutting it.
    #[must_use]
    pub fn line_budget(&self) -> usize {
        self.max_frame_length.saturating_sub(CLOSE_MARKER_LEN)
    }

    /// Width the accumulator actually pre-wraps at, if at all.
    #[must_use]
    pub fn effective_prewrap_width(&self) -> Option<usize> {
        self.prewrap_width
            .map(|width| width.max(self.line_budget()))
    }

    pub fn validate(&self) -> Result<(), FrameError> {
        if self.max_frame_length < MIN_FRAME_LENGTH {
            return Err(FrameError::InvalidConfig(format!(
                "max_frame_length must be at least {MIN_FRAME_LENGTH}, got {}",
                self.max_frame_length
            )));
        }
        if self.prewrap_width == Some(0) {
            return Err(FrameError::InvalidConfig(
                "prewrap_width must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
