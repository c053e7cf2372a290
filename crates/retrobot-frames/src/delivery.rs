//! Frame delivery: coalescing frames into as few sink messages as possible.

use std::collections::VecDeque;

use tracing::debug;

use crate::char_len;
use crate::error::SinkError;
use crate::sink::Sink;
use crate::splitter::Frame;

/// The sink message currently being extended by edits.
#[derive(Debug, Clone)]
pub struct OpenFrame<H> {
    pub handle: H,
    /// Exactly what was last confirmed on the message, as a frame so the
    /// fence padding at its end is still known.
    pub content: Frame,
}

/// Per-session sink call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub sends: usize,
    pub edits: usize,
    pub replies: usize,
    /// Edits skipped because the content was unchanged.
    pub skipped_edits: usize,
}

/// Outcome of delivering one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivered {
    Sent,
    Edited,
    Replied,
    /// No sink call was needed.
    Unchanged,
}

/// Holds formed frames until they are delivered, in arrival order.
#[derive(Debug)]
pub struct DeliveryQueue<H> {
    max_len: usize,
    pending: VecDeque<Frame>,
    open: Option<OpenFrame<H>>,
    stats: DeliveryStats,
}

impl<H: Clone + std::fmt::Debug> DeliveryQueue<H> {
    #[must_use]
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            pending: VecDeque::new(),
            open: None,
            stats: DeliveryStats::default(),
        }
    }

    #[must_use]
    pub fn open(&self) -> Option<&OpenFrame<H>> {
        self.open.as_ref()
    }

    /// Content last confirmed on the open message (empty if none).
    #[must_use]
    pub fn open_content(&self) -> &str {
        self.open.as_ref().map_or("", |open| open.content.content())
    }

    #[must_use]
    pub fn stats(&self) -> DeliveryStats {
        self.stats
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn enqueue(&mut self, frame: Frame) {
        if !frame.is_empty() {
            self.pending.push_back(frame);
        }
    }

    /// Drop the oldest pending frame without delivering it.
    pub fn discard_front(&mut self) -> Option<Frame> {
        self.pending.pop_front()
    }

    /// Deliver the oldest pending frame, joined with any following pending
    /// frames that still fit in one message.
    ///
    /// On failure the frame goes back to the front of the queue for the next
    /// flush. Returns `Ok(None)` when nothing was pending.
    pub async fn flush_one<S>(&mut self, sink: &S) -> Result<Option<Delivered>, SinkError>
    where
        S: Sink<Handle = H> + ?Sized,
    {
        let Some(mut frame) = self.pending.pop_front() else {
            return Ok(None);
        };
        while let Some(next) = self.pending.front() {
            let joined = frame.join(next);
            if joined.len() > self.max_len {
                break;
            }
            frame = joined;
            self.pending.pop_front();
        }

        match self.deliver(sink, frame.clone()).await {
            Ok(delivered) => Ok(Some(delivered)),
            Err(e) => {
                self.pending.push_front(frame);
                Err(e)
            }
        }
    }

    /// Deliver one frame: extend the open message if the merged content stays
    /// under the cap, otherwise start a new message.
    pub async fn deliver<S>(&mut self, sink: &S, frame: Frame) -> Result<Delivered, SinkError>
    where
        S: Sink<Handle = H> + ?Sized,
    {
        if frame.is_empty() {
            return Ok(Delivered::Unchanged);
        }

        let Some(open) = self.open.as_mut() else {
            let handle = sink.send(frame.content()).await?;
            self.stats.sends += 1;
            debug!(chars = frame.len(), "opened message");
            self.open = Some(OpenFrame {
                handle,
                content: frame,
            });
            return Ok(Delivered::Sent);
        };

        let merged = open.content.join(&frame);
        if merged.len() < self.max_len {
            if merged.content() == open.content.content() {
                self.stats.skipped_edits += 1;
                return Ok(Delivered::Unchanged);
            }
            let changed = sink.edit(&open.handle, merged.content()).await?;
            self.stats.edits += 1;
            if changed {
                debug!(chars = merged.len(), "extended message");
                open.content = merged;
            }
            return Ok(Delivered::Edited);
        }

        let handle = sink.reply(&open.handle, frame.content()).await?;
        self.stats.replies += 1;
        debug!(chars = frame.len(), "continued in new message");
        self.open = Some(OpenFrame {
            handle,
            content: frame,
        });
        Ok(Delivered::Replied)
    }

    /// Set the open message to exactly `content`.
    ///
    /// Performs no sink call when `content` equals the open content; sends a
    /// new message when none is open.
    pub async fn sync_open<S>(&mut self, sink: &S, content: &str) -> Result<Delivered, SinkError>
    where
        S: Sink<Handle = H> + ?Sized,
    {
        if char_len(content) > self.max_len {
            return Err(SinkError::new(
                crate::sink::SinkOp::Edit,
                format!("content exceeds {} characters", self.max_len),
            ));
        }

        let Some(open) = self.open.as_mut() else {
            return self.deliver(sink, Frame::new(content)).await;
        };
        if open.content.content() == content {
            self.stats.skipped_edits += 1;
            return Ok(Delivered::Unchanged);
        }
        let changed = sink.edit(&open.handle, content).await?;
        self.stats.edits += 1;
        if changed {
            open.content = Frame::new(content);
        }
        Ok(Delivered::Edited)
    }
}
